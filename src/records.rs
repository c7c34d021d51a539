use std::fmt;

use alloy_primitives::Address;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::amount::TokenAmount;

/// Record key used to window paginated ledger queries.
pub trait Cursored {
    fn cursor(&self) -> u64;
}

/// A periodic consensus commitment carrying an aggregate reward figure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(deserialize_with = "uint_field")]
    pub checkpoint_number: u64,
    pub reward: TokenAmount,
}

impl Cursored for Checkpoint {
    fn cursor(&self) -> u64 {
        self.checkpoint_number
    }
}

/// An account staking through a validator, keyed by a unique counter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegator {
    #[serde(deserialize_with = "uint_field")]
    pub counter: u64,
    pub claimed_rewards: TokenAmount,
    pub delegated_amount: TokenAmount,
    #[serde(deserialize_with = "uint_field")]
    pub validator_id: u64,
    pub address: Address,
}

impl Cursored for Delegator {
    fn cursor(&self) -> u64 {
        self.counter
    }
}

/// A consensus operator holding self-stake and delegated stake.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    #[serde(deserialize_with = "uint_field")]
    pub validator_id: u64,
    pub liquidated_rewards: TokenAmount,
    #[serde(deserialize_with = "uint_field")]
    pub status: u64,
    pub self_stake: TokenAmount,
    pub total_staked: TokenAmount,
    pub delegated_stake: TokenAmount,
}

impl Validator {
    /// Status 0 is the active set; anything else has unbonded or been slashed
    /// and its stake counts as unclaimed.
    pub fn is_active(&self) -> bool {
        self.status == 0
    }
}

impl Cursored for Validator {
    fn cursor(&self) -> u64 {
        self.validator_id
    }
}

// Subgraph BigInt fields arrive as JSON strings, Int fields as numbers.
fn uint_field<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct UintVisitor;

    impl<'de> Visitor<'de> for UintVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a non-negative integer as a string or number")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
            u64::try_from(value).map_err(|_| E::custom(format!("negative value {}", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
            value
                .parse()
                .map_err(|_| E::custom(format!("invalid integer {:?}", value)))
        }
    }

    deserializer.deserialize_any(UintVisitor)
}
