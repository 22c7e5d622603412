use thiserror::Error;

/// Errors returned by the search adapters, the profile fetcher and the LLM client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {service} (retry after {retry_after_secs}s)")]
    RateLimited {
        service: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {service}")]
    UnexpectedStatus { service: String, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required credential for this collaborator is absent.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The model answered, but not in a shape we can use.
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{adapter} timed out after {secs}s")]
    Timeout { adapter: String, secs: u64 },
}

impl SearchError {
    /// `true` when an upstream service asked us to back off.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            SearchError::RateLimited { .. } => true,
            SearchError::Http(e) => {
                e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            SearchError::UnexpectedStatus { status, .. } => *status == 429,
            _ => false,
        }
    }

    /// Seconds the upstream asked us to wait, when it said.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SearchError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
