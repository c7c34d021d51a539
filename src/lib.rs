pub mod amount;
pub mod audit;
pub mod chain;
pub mod config;
pub mod error;
pub mod fanout;
pub mod records;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod subgraph;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub use audit::{run_audit, StakingLedger};
pub use chain::{EthRpcClient, StakingChain};
pub use config::AuditConfig;
pub use error::AuditError;
pub use report::AuditReport;
pub use subgraph::SubgraphClient;
