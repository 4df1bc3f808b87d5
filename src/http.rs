//! Shared HTTP plumbing for provider gateways.
//!
//! All provider adapters funnel their requests through
//! [`send_with_retry`], which applies the same retry strategy:
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use crate::error::ProviderError;

/// Send a request up to `1 + max_retries` times and return the parsed
/// JSON body of the first successful response.
///
/// `build` is called once per attempt because a `RequestBuilder` is
/// consumed by sending. Errors are [`ProviderError`]s tagged with
/// `provider` so callers can tell which external service failed.
pub(crate) async fn send_with_retry<F>(
    provider: &'static str,
    max_retries: u32,
    build: F,
) -> Result<serde_json::Value, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err: Option<ProviderError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json::<serde_json::Value>().await.map_err(|e| {
                        ProviderError::InvalidResponse {
                            provider,
                            detail: e.to_string(),
                        }
                    });
                }

                let body = response.text().await.unwrap_or_default();
                let err = ProviderError::Api {
                    provider,
                    status: status.as_u16(),
                    body,
                };

                if err.is_retryable() {
                    last_err = Some(err);
                    continue;
                }

                return Err(err);
            }
            Err(e) => {
                last_err = Some(ProviderError::Network {
                    provider,
                    source: e,
                });
                continue;
            }
        }
    }

    Err(last_err.unwrap_or(ProviderError::InvalidResponse {
        provider,
        detail: "request failed after retries".to_string(),
    }))
}

/// Build a reqwest client with the given request timeout.
pub(crate) fn client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::Network {
            provider: "http",
            source: e,
        })
}
