use std::fmt;

use num_bigint::BigInt;

use crate::amount::TokenAmount;

/// A complete point-in-time reconciliation snapshot, ready to render.
///
/// Accumulator fields hold the raw scan sums; derived quantities are computed
/// on access so each appears in exactly one place. Labels match the original
/// audit script so output stays diffable across the two tools.
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// Unix epoch milliseconds at the start of the run.
    pub timestamp_ms: i64,
    pub matic_balance: TokenAmount,
    pub total_stake: TokenAmount,
    /// Highest checkpoint number observed by the probe; 0 when empty.
    pub last_checkpoint: u64,
    pub checkpoint_rewards: TokenAmount,
    /// Highest delegator counter observed by the probe; 0 when empty.
    pub last_delegator: u64,
    pub delegator_claimed_rewards: TokenAmount,
    pub delegator_unclaimed_rewards: TokenAmount,
    pub delegator_stake: TokenAmount,
    /// Highest validator id observed by the probe; 0 when empty.
    pub last_validator: u64,
    pub validator_claimed_rewards: TokenAmount,
    pub validator_unclaimed_rewards: TokenAmount,
    pub validator_self_stake: TokenAmount,
    /// Stake delegated to validators that left the active set.
    pub delegator_unclaimed_stake: TokenAmount,
    /// Self-stake of validators that left the active set.
    pub validator_unclaimed_stake: TokenAmount,
    /// totalStaked recorded for validators that left the active set.
    pub validator_unclaimed_total_staked: TokenAmount,
}

impl AuditReport {
    /// Balance not accounted for by stake; funds the reward distribution.
    pub fn remaining_for_rewards(&self) -> BigInt {
        self.matic_balance.to_signed() - self.total_stake.to_signed()
    }

    /// Inactive stake reconstructed from its two parts; should match
    /// `validator_unclaimed_total_staked`.
    pub fn inactive_stake(&self) -> TokenAmount {
        &self.validator_unclaimed_stake + &self.delegator_unclaimed_stake
    }

    /// Checkpoint rewards minus everything already claimed.
    pub fn net_unclaimed_rewards(&self) -> BigInt {
        self.checkpoint_rewards.to_signed()
            - self.delegator_claimed_rewards.to_signed()
            - self.validator_claimed_rewards.to_signed()
    }

    /// Stake according to the ledger; should match `total_stake`.
    pub fn ledger_stake(&self) -> BigInt {
        self.delegator_stake.to_signed() + self.validator_self_stake.to_signed()
            - self.validator_unclaimed_total_staked.to_signed()
    }

    /// The residual balance check. Zero when contract state and ledger agree.
    pub fn surplus(&self) -> BigInt {
        self.matic_balance.to_signed()
            - self.total_stake.to_signed()
            - self.validator_unclaimed_stake.to_signed()
            - self.delegator_unclaimed_stake.to_signed()
            - self.delegator_unclaimed_rewards.to_signed()
            - self.validator_unclaimed_rewards.to_signed()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current timestamp: {}", self.timestamp_ms)?;
        writeln!(f, "Current MATIC balance: {}", self.matic_balance)?;
        writeln!(f, "Current MATIC staked: {}", self.total_stake)?;
        writeln!(
            f,
            "MATIC remaining for reward distribution: {}",
            self.remaining_for_rewards()
        )?;
        writeln!(f, "Last checkpoint number: {}", self.last_checkpoint)?;
        writeln!(f, "Total checkpoint rewards: {}", self.checkpoint_rewards)?;
        writeln!(f, "Last delegator number: {}", self.last_delegator)?;
        writeln!(
            f,
            "Total delegator claimed rewards: {}",
            self.delegator_claimed_rewards
        )?;
        writeln!(
            f,
            "Total delegator unclaimed rewards: {}",
            self.delegator_unclaimed_rewards
        )?;
        writeln!(f, "Total delegator stake: {}", self.delegator_stake)?;
        writeln!(f, "Last validator ID: {}", self.last_validator)?;
        writeln!(
            f,
            "Total validator claimed rewards: {}",
            self.validator_claimed_rewards
        )?;
        writeln!(
            f,
            "Total validator unclaimed rewards: {}",
            self.validator_unclaimed_rewards
        )?;
        writeln!(f, "Total validator self-stake: {}", self.validator_self_stake)?;
        writeln!(
            f,
            "Total inactive delegator stake: {}",
            self.delegator_unclaimed_stake
        )?;
        writeln!(
            f,
            "Total inactive validator stake: {}",
            self.validator_unclaimed_stake
        )?;
        writeln!(
            f,
            "Total inactive total staked: {}",
            self.validator_unclaimed_total_staked
        )?;
        writeln!(
            f,
            "Compare inactive stake amounts {} {}",
            self.inactive_stake(),
            self.validator_unclaimed_total_staked
        )?;
        writeln!(f, "Total unclaimed rewards: {}", self.net_unclaimed_rewards())?;
        writeln!(
            f,
            "Compare stake amount: {} {}",
            self.total_stake,
            self.ledger_stake()
        )?;
        writeln!(f, "Surplus {}", self.surplus())
    }
}
