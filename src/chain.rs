use alloy_primitives::{hex, keccak256, Address};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::retry::{with_retry, RetryPolicy};

/// Read-only staking contract surface the reconciliation engine consumes.
#[async_trait]
pub trait StakingChain: Send + Sync {
    /// MATIC balance currently held by the staking contract.
    async fn staking_contract_balance(&self) -> Result<TokenAmount, AuditError>;

    /// Aggregate stake of the current validator set.
    async fn current_total_stake(&self) -> Result<TokenAmount, AuditError>;

    /// ValidatorShare contract backing a validator id.
    async fn validator_share_contract(&self, validator_id: u64) -> Result<Address, AuditError>;

    /// Accrued but unclaimed reward of a validator.
    async fn validator_reward(&self, validator_id: u64) -> Result<TokenAmount, AuditError>;

    /// Accrued but unclaimed reward of a delegator on a ValidatorShare contract.
    async fn liquid_rewards(
        &self,
        share_contract: Address,
        delegator: Address,
    ) -> Result<TokenAmount, AuditError>;
}

// Contract method signatures, hashed into ABI selectors on use
const BALANCE_OF: &str = "balanceOf(address)";
const CURRENT_TOTAL_STAKE: &str = "currentValidatorSetTotalStake()";
const GET_VALIDATOR_CONTRACT: &str = "getValidatorContract(uint256)";
const VALIDATOR_REWARD: &str = "validatorReward(uint256)";
const GET_LIQUID_REWARDS: &str = "getLiquidRewards(address)";

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC `eth_call` client for the staking contracts.
pub struct EthRpcClient {
    rpc_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
    stake_manager: Address,
    token: Address,
}

impl EthRpcClient {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuditError::transport("building HTTP client", e))?;

        Ok(EthRpcClient {
            rpc_url: config.rpc_url.clone(),
            client,
            retry: config.retry,
            stake_manager: config.stake_manager,
            token: config.token,
        })
    }

    /// Issue `eth_call` against `to` with ABI-encoded calldata, returning the
    /// decoded result bytes.
    async fn eth_call(
        &self,
        what: &'static str,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, AuditError> {
        let calldata = format!("0x{}", hex::encode(&data));
        debug!("eth_call {} to {}", what, to);

        with_retry(what, self.retry, || {
            let calldata = calldata.as_str();
            async move {
                let request = RpcRequest {
                    jsonrpc: "2.0",
                    id: 1,
                    method: "eth_call",
                    params: vec![
                        serde_json::json!({
                            "to": to.to_string(),
                            "data": calldata,
                        }),
                        serde_json::json!("latest"),
                    ],
                };

                let response = self
                    .client
                    .post(&self.rpc_url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| AuditError::http(what, e))?
                    .error_for_status()
                    .map_err(|e| AuditError::http(what, e))?;

                let body: RpcResponse<String> =
                    response.json().await.map_err(|e| AuditError::http(what, e))?;

                if let Some(err) = body.error {
                    return Err(AuditError::Rpc {
                        what: what.to_string(),
                        code: err.code,
                        message: err.message,
                    });
                }

                let result = body
                    .result
                    .ok_or_else(|| AuditError::malformed(what, "no result in RPC response"))?;
                let stripped = result.strip_prefix("0x").unwrap_or(&result);
                hex::decode(stripped)
                    .map_err(|e| AuditError::malformed(what, format!("result is not hex: {}", e)))
            }
        })
        .await
    }
}

#[async_trait]
impl StakingChain for EthRpcClient {
    async fn staking_contract_balance(&self) -> Result<TokenAmount, AuditError> {
        let data = encode_address_call(BALANCE_OF, self.stake_manager);
        let raw = self.eth_call("balanceOf", self.token, data).await?;
        decode_uint_word("balanceOf", &raw)
    }

    async fn current_total_stake(&self) -> Result<TokenAmount, AuditError> {
        let raw = self
            .eth_call(
                "currentValidatorSetTotalStake",
                self.stake_manager,
                encode_call(CURRENT_TOTAL_STAKE),
            )
            .await?;
        decode_uint_word("currentValidatorSetTotalStake", &raw)
    }

    async fn validator_share_contract(&self, validator_id: u64) -> Result<Address, AuditError> {
        let data = encode_uint_call(GET_VALIDATOR_CONTRACT, validator_id);
        let raw = self
            .eth_call("getValidatorContract", self.stake_manager, data)
            .await?;
        decode_address_word("getValidatorContract", &raw)
    }

    async fn validator_reward(&self, validator_id: u64) -> Result<TokenAmount, AuditError> {
        let data = encode_uint_call(VALIDATOR_REWARD, validator_id);
        let raw = self
            .eth_call("validatorReward", self.stake_manager, data)
            .await?;
        decode_uint_word("validatorReward", &raw)
    }

    async fn liquid_rewards(
        &self,
        share_contract: Address,
        delegator: Address,
    ) -> Result<TokenAmount, AuditError> {
        let data = encode_address_call(GET_LIQUID_REWARDS, delegator);
        let raw = self.eth_call("getLiquidRewards", share_contract, data).await?;
        decode_uint_word("getLiquidRewards", &raw)
    }
}

// First four bytes of the keccak-256 of the method signature
pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Calldata for a method taking no arguments.
pub(crate) fn encode_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

/// Calldata for a method taking a single address argument.
pub(crate) fn encode_address_call(signature: &str, value: Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(value.as_slice());
    data
}

/// Calldata for a method taking a single uint256 argument.
pub(crate) fn encode_uint_call(signature: &str, value: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&value.to_be_bytes());
    data
}

/// Decode a single uint256 return word.
pub(crate) fn decode_uint_word(what: &str, raw: &[u8]) -> Result<TokenAmount, AuditError> {
    if raw.len() != 32 {
        return Err(AuditError::malformed(
            what,
            format!("expected a 32-byte word, got {} bytes", raw.len()),
        ));
    }
    Ok(TokenAmount::from_be_bytes(raw))
}

/// Decode a single address return word.
pub(crate) fn decode_address_word(what: &str, raw: &[u8]) -> Result<Address, AuditError> {
    if raw.len() != 32 {
        return Err(AuditError::malformed(
            what,
            format!("expected a 32-byte word, got {} bytes", raw.len()),
        ));
    }
    Ok(Address::from_slice(&raw[12..32]))
}
