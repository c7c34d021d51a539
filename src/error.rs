use thiserror::Error;

/// Failure surface for a reconciliation run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Network-level failure talking to an upstream endpoint.
    #[error("transport failure during {what}: {source}")]
    Transport {
        what: String,
        #[source]
        source: reqwest::Error,
    },

    /// The Ethereum node answered with a JSON-RPC error object.
    #[error("JSON-RPC error {code} during {what}: {message}")]
    Rpc {
        what: String,
        code: i64,
        message: String,
    },

    /// The subgraph answered with a GraphQL errors array.
    #[error("subgraph query for {what} failed: {message}")]
    Subgraph { what: String, message: String },

    /// A response arrived but did not have the promised shape.
    #[error("malformed response from {what}: {detail}")]
    Malformed { what: String, detail: String },

    /// A reward fan-out worker failed to complete.
    #[error("reward fan-out failed: {0}")]
    Fanout(String),
}

impl AuditError {
    pub fn transport(what: &str, source: reqwest::Error) -> Self {
        AuditError::Transport {
            what: what.to_string(),
            source,
        }
    }

    pub fn malformed(what: &str, detail: impl Into<String>) -> Self {
        AuditError::Malformed {
            what: what.to_string(),
            detail: detail.into(),
        }
    }

    /// Classify a reqwest failure: body-decode problems are malformed data,
    /// everything else (connect, timeout, HTTP status) is transport.
    pub fn http(what: &str, source: reqwest::Error) -> Self {
        if source.is_decode() {
            AuditError::malformed(what, source.to_string())
        } else {
            AuditError::transport(what, source)
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuditError::Transport { .. })
    }
}
