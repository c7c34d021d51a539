use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;

use stake_audit::audit::run_audit;
use stake_audit::chain::EthRpcClient;
use stake_audit::config::{AuditConfig, DEFAULT_SUBGRAPH_URL};
use stake_audit::retry::RetryPolicy;
use stake_audit::subgraph::SubgraphClient;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ethereum JSON-RPC endpoint (defaults to $RPC_URL, then a public node)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Staking root subgraph endpoint
    #[arg(long, default_value = DEFAULT_SUBGRAPH_URL)]
    subgraph_url: String,

    /// StakeManager contract address override
    #[arg(long)]
    stake_manager: Option<String>,

    /// MATIC token contract address override
    #[arg(long)]
    token: Option<String>,

    /// Records per ledger page
    #[arg(long, default_value_t = 1000)]
    page_size: u32,

    /// Maximum in-flight reward calls
    #[arg(long, default_value_t = 32)]
    concurrency: usize,

    /// Attempts per upstream call before giving up
    #[arg(long, default_value_t = 4)]
    retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = AuditConfig::default();
    if let Some(url) = args.rpc_url {
        config.rpc_url = url;
    } else if let Ok(url) = std::env::var("RPC_URL") {
        config.rpc_url = url;
    }
    config.subgraph_url = args.subgraph_url;
    if let Some(address) = args.stake_manager {
        config.stake_manager = address.parse().context("invalid --stake-manager address")?;
    }
    if let Some(address) = args.token {
        config.token = address.parse().context("invalid --token address")?;
    }
    config.page_size = args.page_size;
    config.fanout_concurrency = args.concurrency;
    config.retry = RetryPolicy {
        attempts: args.retries,
        ..RetryPolicy::default()
    };
    config.request_timeout = Duration::from_secs(args.timeout_secs);

    info!("stake audit starting: rpc {}", config.rpc_url);

    let chain = Arc::new(EthRpcClient::new(&config)?);
    let ledger = SubgraphClient::new(&config)?;
    let report = run_audit(&config, chain, &ledger).await?;
    print!("{}", report);

    Ok(())
}
