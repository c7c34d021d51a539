use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use log::{debug, info};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::amount::TokenAmount;
use crate::chain::StakingChain;
use crate::error::AuditError;

/// Bounded fan-out of per-delegator unclaimed-reward lookups.
///
/// Share-contract resolution happens once per distinct validator, up front
/// and sequentially; the reward calls then run concurrently under a semaphore
/// so large ledgers cannot flood the RPC endpoint.
pub struct RewardFanout {
    chain: Arc<dyn StakingChain>,
    concurrency: usize,
}

impl RewardFanout {
    pub fn new(chain: Arc<dyn StakingChain>, concurrency: usize) -> Self {
        RewardFanout {
            chain,
            concurrency: concurrency.max(1),
        }
    }

    /// Sum `getLiquidRewards` across every (validator, delegator) pair. Any
    /// single failed call fails the whole aggregate; remaining in-flight
    /// calls are aborted.
    pub async fn total_unclaimed(
        &self,
        pairs: &[(u64, Address)],
    ) -> Result<TokenAmount, AuditError> {
        let contracts = self.resolve_share_contracts(pairs).await?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut calls: JoinSet<Result<TokenAmount, AuditError>> = JoinSet::new();
        for (validator_id, delegator) in pairs.iter().copied() {
            let share = contracts[&validator_id];
            let chain = Arc::clone(&self.chain);
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| AuditError::Fanout(e.to_string()))?;
            calls.spawn(async move {
                let _permit = permit;
                chain.liquid_rewards(share, delegator).await
            });
        }

        let mut total = TokenAmount::zero();
        while let Some(joined) = calls.join_next().await {
            let reward = joined.map_err(|e| AuditError::Fanout(e.to_string()))??;
            total += &reward;
        }

        info!(
            "fetched unclaimed rewards for {} delegations across {} validators",
            pairs.len(),
            contracts.len()
        );
        Ok(total)
    }

    /// Resolve each distinct validator's ValidatorShare contract exactly once.
    async fn resolve_share_contracts(
        &self,
        pairs: &[(u64, Address)],
    ) -> Result<HashMap<u64, Address>, AuditError> {
        let mut contracts: HashMap<u64, Address> = HashMap::new();
        for (validator_id, _) in pairs {
            if contracts.contains_key(validator_id) {
                continue;
            }
            let share = self.chain.validator_share_contract(*validator_id).await?;
            debug!("validator {} delegates through {}", validator_id, share);
            contracts.insert(*validator_id, share);
        }
        Ok(contracts)
    }
}
