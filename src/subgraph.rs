use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::records::{Checkpoint, Delegator, Validator};
use crate::retry::{with_retry, RetryPolicy};
use crate::scanner::{OrderDirection, PageFetcher, PageRequest};

/// GraphQL client for the staking root subgraph.
pub struct SubgraphClient {
    endpoint: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct GraphResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphError>>,
}

#[derive(Deserialize)]
struct GraphError {
    message: String,
}

impl SubgraphClient {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuditError::transport("building HTTP client", e))?;

        Ok(SubgraphClient {
            endpoint: config.subgraph_url.clone(),
            client,
            retry: config.retry,
        })
    }

    /// POST a query and pull the named entity list out of the response.
    async fn query<T>(&self, entity: &'static str, query: String) -> Result<Vec<T>, AuditError>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!("subgraph query: {}", query);

        with_retry(entity, self.retry, || {
            let query = query.as_str();
            async move {
                let body = serde_json::json!({ "query": query });
                let response = self
                    .client
                    .post(&self.endpoint)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AuditError::http(entity, e))?
                    .error_for_status()
                    .map_err(|e| AuditError::http(entity, e))?;

                let envelope: GraphResponse = response
                    .json()
                    .await
                    .map_err(|e| AuditError::http(entity, e))?;

                if let Some(errors) = envelope.errors {
                    let message = errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(AuditError::Subgraph {
                        what: entity.to_string(),
                        message,
                    });
                }

                let data = envelope.data.ok_or_else(|| {
                    AuditError::malformed(entity, "response has neither data nor errors")
                })?;
                let records = data.get(entity).cloned().ok_or_else(|| {
                    AuditError::malformed(entity, "entity missing from response data")
                })?;
                serde_json::from_value(records)
                    .map_err(|e| AuditError::malformed(entity, e.to_string()))
            }
        })
        .await
    }
}

// Query text matching TheGraph pagination arguments
fn page_query(entity: &str, cursor_field: &str, fields: &str, request: PageRequest) -> String {
    let direction = match request.direction {
        OrderDirection::Asc => "asc",
        OrderDirection::Desc => "desc",
    };
    match request.min_cursor {
        Some(min) => format!(
            "{{ {}(first: {}, where: {{{}_gte: {}}}, orderBy: {}, orderDirection: {}) {{ {} }} }}",
            entity, request.first, cursor_field, min, cursor_field, direction, fields
        ),
        None => format!(
            "{{ {}(first: {}, orderBy: {}, orderDirection: {}) {{ {} }} }}",
            entity, request.first, cursor_field, direction, fields
        ),
    }
}

#[async_trait]
impl PageFetcher<Checkpoint> for SubgraphClient {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Checkpoint>, AuditError> {
        let query = page_query(
            "checkpoints",
            "checkpointNumber",
            "checkpointNumber reward",
            request,
        );
        self.query("checkpoints", query).await
    }
}

#[async_trait]
impl PageFetcher<Delegator> for SubgraphClient {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Delegator>, AuditError> {
        let query = page_query(
            "delegators",
            "counter",
            "counter claimedRewards delegatedAmount validatorId address",
            request,
        );
        self.query("delegators", query).await
    }
}

#[async_trait]
impl PageFetcher<Validator> for SubgraphClient {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Validator>, AuditError> {
        let query = page_query(
            "validators",
            "validatorId",
            "validatorId liquidatedRewards status selfStake totalStaked delegatedStake",
            request,
        );
        self.query("validators", query).await
    }
}
