use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, ParseBigIntError};
use num_traits::Zero;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// A non-negative token amount in wei, of unbounded magnitude.
///
/// On-chain supplies routinely exceed the 64-bit range, so every amount read
/// from the ledger or a contract is parsed into this before any arithmetic.
/// The subgraph serializes BigInt fields as JSON strings and Int fields as
/// numbers; deserialization accepts both and rejects anything negative or
/// non-integral.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TokenAmount(BigUint);

impl TokenAmount {
    pub fn zero() -> Self {
        TokenAmount(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Interpret a big-endian byte string (an ABI uint256 word) as an amount.
    pub fn from_be_bytes(raw: &[u8]) -> Self {
        TokenAmount(BigUint::from_bytes_be(raw))
    }

    /// Signed view for derived quantities computed by subtraction.
    pub fn to_signed(&self) -> BigInt {
        BigInt::from(self.0.clone())
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        TokenAmount(BigUint::from(value))
    }
}

impl FromStr for TokenAmount {
    type Err = ParseBigIntError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        BigUint::from_str(text).map(TokenAmount)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AddAssign<&TokenAmount> for TokenAmount {
    fn add_assign(&mut self, rhs: &TokenAmount) {
        self.0 += &rhs.0;
    }
}

impl Add<&TokenAmount> for &TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: &TokenAmount) -> TokenAmount {
        TokenAmount(&self.0 + &rhs.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = TokenAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a non-negative integer as a string or number")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<TokenAmount, E> {
                Ok(TokenAmount::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<TokenAmount, E> {
                u64::try_from(value)
                    .map(TokenAmount::from)
                    .map_err(|_| E::custom(format!("negative amount {}", value)))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<TokenAmount, E> {
                value
                    .parse()
                    .map_err(|_| E::custom(format!("invalid amount {:?}", value)))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
