use std::sync::Arc;

use alloy_primitives::Address;
use chrono::Utc;
use log::{info, warn};
use num_traits::Zero;

use crate::amount::TokenAmount;
use crate::chain::StakingChain;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::fanout::RewardFanout;
use crate::records::{Checkpoint, Delegator, Validator};
use crate::report::AuditReport;
use crate::scanner::{LedgerScan, PageFetcher};

/// Ledger access the engine needs: one paged fetcher per entity.
pub trait StakingLedger:
    PageFetcher<Checkpoint> + PageFetcher<Delegator> + PageFetcher<Validator>
{
}

impl<L> StakingLedger for L where
    L: PageFetcher<Checkpoint> + PageFetcher<Delegator> + PageFetcher<Validator>
{
}

struct CheckpointTotals {
    rewards: TokenAmount,
    last: u64,
}

struct DelegatorTotals {
    claimed: TokenAmount,
    staked: TokenAmount,
    unclaimed: TokenAmount,
    last: u64,
}

#[derive(Default)]
struct ValidatorTotals {
    claimed: TokenAmount,
    unclaimed: TokenAmount,
    self_stake: TokenAmount,
    inactive_self_stake: TokenAmount,
    inactive_delegated: TokenAmount,
    inactive_total_staked: TokenAmount,
    last: u64,
}

/// Run one full reconciliation pass and return the report snapshot.
///
/// The two direct contract reads and the three ledger scans are independent
/// and run concurrently; the first failure aborts the whole run and no
/// report is produced.
pub async fn run_audit<L>(
    config: &AuditConfig,
    chain: Arc<dyn StakingChain>,
    ledger: &L,
) -> Result<AuditReport, AuditError>
where
    L: StakingLedger,
{
    let started = Utc::now();
    info!(
        "reconciling staking state: ledger {} against chain {}",
        config.subgraph_url, config.rpc_url
    );

    let (balance, total_stake, checkpoints, delegators, validators) = tokio::try_join!(
        chain.staking_contract_balance(),
        chain.current_total_stake(),
        scan_checkpoints(ledger, config.page_size),
        scan_delegators(ledger, Arc::clone(&chain), config),
        scan_validators(ledger, chain.as_ref(), config.page_size),
    )?;

    let report = AuditReport {
        timestamp_ms: started.timestamp_millis(),
        matic_balance: balance,
        total_stake,
        last_checkpoint: checkpoints.last,
        checkpoint_rewards: checkpoints.rewards,
        last_delegator: delegators.last,
        delegator_claimed_rewards: delegators.claimed,
        delegator_unclaimed_rewards: delegators.unclaimed,
        delegator_stake: delegators.staked,
        last_validator: validators.last,
        validator_claimed_rewards: validators.claimed,
        validator_unclaimed_rewards: validators.unclaimed,
        validator_self_stake: validators.self_stake,
        delegator_unclaimed_stake: validators.inactive_delegated,
        validator_unclaimed_stake: validators.inactive_self_stake,
        validator_unclaimed_total_staked: validators.inactive_total_staked,
    };

    let surplus = report.surplus();
    if !surplus.is_zero() {
        warn!("nonzero surplus: {} wei unaccounted for", surplus);
    }
    info!(
        "reconciliation finished in {} ms",
        (Utc::now() - started).num_milliseconds()
    );

    Ok(report)
}

async fn scan_checkpoints<L>(ledger: &L, page_size: u32) -> Result<CheckpointTotals, AuditError>
where
    L: PageFetcher<Checkpoint>,
{
    let mut scan = LedgerScan::<Checkpoint, _>::begin(ledger, page_size).await?;
    let last = scan.last_cursor();
    let mut rewards = TokenAmount::zero();
    let mut seen = 0usize;
    while let Some(page) = scan.next_page().await? {
        for checkpoint in &page {
            rewards += &checkpoint.reward;
        }
        seen += page.len();
    }
    info!("checkpoint scan: {} records up to cursor {}", seen, last);
    Ok(CheckpointTotals { rewards, last })
}

async fn scan_delegators<L>(
    ledger: &L,
    chain: Arc<dyn StakingChain>,
    config: &AuditConfig,
) -> Result<DelegatorTotals, AuditError>
where
    L: PageFetcher<Delegator>,
{
    let mut scan = LedgerScan::<Delegator, _>::begin(ledger, config.page_size).await?;
    let last = scan.last_cursor();
    let mut claimed = TokenAmount::zero();
    let mut staked = TokenAmount::zero();
    let mut pairs: Vec<(u64, Address)> = Vec::new();
    while let Some(page) = scan.next_page().await? {
        for delegator in &page {
            claimed += &delegator.claimed_rewards;
            staked += &delegator.delegated_amount;
            pairs.push((delegator.validator_id, delegator.address));
        }
    }
    info!("delegator scan: {} records up to cursor {}", pairs.len(), last);

    // Reward lookups are deferred until the scan is complete, then fanned out.
    let fanout = RewardFanout::new(chain, config.fanout_concurrency);
    let unclaimed = fanout.total_unclaimed(&pairs).await?;

    Ok(DelegatorTotals {
        claimed,
        staked,
        unclaimed,
        last,
    })
}

async fn scan_validators<L>(
    ledger: &L,
    chain: &dyn StakingChain,
    page_size: u32,
) -> Result<ValidatorTotals, AuditError>
where
    L: PageFetcher<Validator>,
{
    let mut scan = LedgerScan::<Validator, _>::begin(ledger, page_size).await?;
    let mut totals = ValidatorTotals {
        last: scan.last_cursor(),
        ..Default::default()
    };
    let mut seen = 0usize;
    while let Some(page) = scan.next_page().await? {
        for validator in &page {
            totals.claimed += &validator.liquidated_rewards;
            let reward = chain.validator_reward(validator.validator_id).await?;
            totals.unclaimed += &reward;
            if validator.is_active() {
                totals.self_stake += &validator.self_stake;
            } else {
                totals.inactive_self_stake += &validator.self_stake;
                totals.inactive_delegated += &validator.delegated_stake;
                totals.inactive_total_staked += &validator.total_staked;
            }
            seen += 1;
        }
    }
    info!("validator scan: {} records up to cursor {}", seen, totals.last);
    Ok(totals)
}
