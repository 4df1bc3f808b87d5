//! Provider error taxonomy.
//!
//! [`ProviderError`] covers every failure mode of the external embedding,
//! completion, and vector-store providers. The gateways raise these and
//! never swallow them; the retriever and indexer decide what degrades
//! gracefully and what is reported back to the caller.

use thiserror::Error;

/// A failure talking to an external provider (embedding, completion, or
/// vector store).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure: connect, TLS, or timeout.
    #[error("{provider} request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered successfully but the payload did not have
    /// the expected shape.
    #[error("{provider} returned a malformed response: {detail}")]
    InvalidResponse {
        provider: &'static str,
        detail: String,
    },

    /// A required credential is missing from the environment.
    #[error("{0} environment variable not set")]
    MissingCredentials(&'static str),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed: rate limits, server
    /// errors, and transport failures. Other client errors fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network { .. } => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = ProviderError::Api {
            provider: "openai",
            status: 429,
            body: String::new(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = ProviderError::Api {
            provider: "pinecone",
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_error_is_not_retryable() {
        let err = ProviderError::Api {
            provider: "openai",
            status: 401,
            body: "bad key".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_credentials_is_not_retryable() {
        assert!(!ProviderError::MissingCredentials("OPENAI_API_KEY").is_retryable());
    }
}
