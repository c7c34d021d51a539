use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::retry::RetryPolicy;

/// Ethereum mainnet RPC endpoint used when no override is given.
pub const DEFAULT_RPC_URL: &str = "https://rpc.ankr.com/eth";

/// Polygon root-chain staking ledger on TheGraph.
pub const DEFAULT_SUBGRAPH_URL: &str =
    "https://api.thegraph.com/subgraphs/name/maticnetwork/mainnet-root-subgraphs";

// Mainnet contract addresses
pub const STAKE_MANAGER: Address = address!("5e3Ef299fDDf15eAa0432E6e66473ace8c13D908");
pub const MATIC_TOKEN: Address = address!("7D1AfA7B718fb893dB30A3aBc0Cfc608AaCfeBB0");

/// Settings for one reconciliation run.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub rpc_url: String,
    pub subgraph_url: String,
    pub stake_manager: Address,
    pub token: Address,
    /// Records per windowed ledger query.
    pub page_size: u32,
    /// In-flight cap for the per-delegator reward fan-out.
    pub fanout_concurrency: usize,
    pub retry: RetryPolicy,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            subgraph_url: DEFAULT_SUBGRAPH_URL.to_string(),
            stake_manager: STAKE_MANAGER,
            token: MATIC_TOKEN,
            page_size: 1000,
            fanout_concurrency: 32,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}
