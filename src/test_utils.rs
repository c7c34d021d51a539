use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::amount::TokenAmount;
use crate::chain::StakingChain;
use crate::error::AuditError;
use crate::records::{Checkpoint, Cursored, Delegator, Validator};
use crate::scanner::{OrderDirection, PageFetcher, PageRequest};

pub fn amount(value: u64) -> TokenAmount {
    TokenAmount::from(value)
}

pub fn big_amount(text: &str) -> TokenAmount {
    text.parse().expect("valid decimal amount")
}

pub fn test_address(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..20].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}

/// Deterministic ValidatorShare address the mock chain hands out.
pub fn share_contract_for(validator_id: u64) -> Address {
    let mut bytes = [0xabu8; 20];
    bytes[12..20].copy_from_slice(&validator_id.to_be_bytes());
    Address::from(bytes)
}

pub fn create_test_checkpoint(number: u64, reward: u64) -> Checkpoint {
    Checkpoint {
        checkpoint_number: number,
        reward: amount(reward),
    }
}

pub fn create_test_delegator(
    counter: u64,
    claimed: u64,
    staked: u64,
    validator_id: u64,
    address: Address,
) -> Delegator {
    Delegator {
        counter,
        claimed_rewards: amount(claimed),
        delegated_amount: amount(staked),
        validator_id,
        address,
    }
}

pub fn create_test_validator(
    validator_id: u64,
    liquidated: u64,
    status: u64,
    self_stake: u64,
    total_staked: u64,
    delegated_stake: u64,
) -> Validator {
    Validator {
        validator_id,
        liquidated_rewards: amount(liquidated),
        status,
        self_stake: amount(self_stake),
        total_staked: amount(total_staked),
        delegated_stake: amount(delegated_stake),
    }
}

/// Scripted chain client with call counting and failure injection.
#[derive(Default)]
pub struct MockChain {
    pub balance: TokenAmount,
    pub total_stake: TokenAmount,
    /// validatorReward per validator id; absent ids answer zero.
    pub validator_rewards: HashMap<u64, u64>,
    /// getLiquidRewards per (share contract, delegator); absent pairs answer zero.
    pub liquid_rewards: HashMap<(Address, Address), u64>,
    /// Any liquid-rewards call for this delegator fails.
    pub fail_liquid_for: Option<Address>,
    /// Artificial latency per liquid-rewards call, for concurrency tests.
    pub call_delay: Duration,
    pub resolutions: AtomicUsize,
    pub liquid_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

#[async_trait]
impl StakingChain for MockChain {
    async fn staking_contract_balance(&self) -> Result<TokenAmount, AuditError> {
        Ok(self.balance.clone())
    }

    async fn current_total_stake(&self) -> Result<TokenAmount, AuditError> {
        Ok(self.total_stake.clone())
    }

    async fn validator_share_contract(&self, validator_id: u64) -> Result<Address, AuditError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        Ok(share_contract_for(validator_id))
    }

    async fn validator_reward(&self, validator_id: u64) -> Result<TokenAmount, AuditError> {
        Ok(amount(
            self.validator_rewards.get(&validator_id).copied().unwrap_or(0),
        ))
    }

    async fn liquid_rewards(
        &self,
        share_contract: Address,
        delegator: Address,
    ) -> Result<TokenAmount, AuditError> {
        self.liquid_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_liquid_for == Some(delegator) {
            return Err(AuditError::Rpc {
                what: "getLiquidRewards".to_string(),
                code: -32000,
                message: "injected failure".to_string(),
            });
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(amount(
            self.liquid_rewards
                .get(&(share_contract, delegator))
                .copied()
                .unwrap_or(0),
        ))
    }
}

/// In-memory ledger honoring the page-request semantics of the subgraph,
/// with probe/window query counting.
#[derive(Default)]
pub struct MockLedger {
    pub checkpoints: Vec<Checkpoint>,
    pub delegators: Vec<Delegator>,
    pub validators: Vec<Validator>,
    pub probe_queries: AtomicUsize,
    pub window_queries: AtomicUsize,
}

impl MockLedger {
    fn page_of<T: Cursored + Clone>(&self, records: &[T], request: PageRequest) -> Vec<T> {
        if request.min_cursor.is_some() {
            self.window_queries.fetch_add(1, Ordering::SeqCst);
        } else {
            self.probe_queries.fetch_add(1, Ordering::SeqCst);
        }

        let mut page: Vec<T> = records.to_vec();
        match request.direction {
            OrderDirection::Asc => page.sort_by_key(|r| r.cursor()),
            OrderDirection::Desc => page.sort_by_key(|r| std::cmp::Reverse(r.cursor())),
        }
        if let Some(min) = request.min_cursor {
            page.retain(|r| r.cursor() >= min);
        }
        page.truncate(request.first as usize);
        page
    }
}

#[async_trait]
impl PageFetcher<Checkpoint> for MockLedger {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Checkpoint>, AuditError> {
        Ok(self.page_of(&self.checkpoints, request))
    }
}

#[async_trait]
impl PageFetcher<Delegator> for MockLedger {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Delegator>, AuditError> {
        Ok(self.page_of(&self.delegators, request))
    }
}

#[async_trait]
impl PageFetcher<Validator> for MockLedger {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Validator>, AuditError> {
        Ok(self.page_of(&self.validators, request))
    }
}
