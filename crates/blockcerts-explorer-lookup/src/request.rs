//! JSON-over-HTTP fetcher with retry logic, shared by explorers and document retrieval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ExplorerError;

/// Default HTTP request timeout
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on the time spent retrying a single request
pub const MAX_RETRY_ELAPSED_TIME: Duration = Duration::from_secs(30);

/// Fetch a JSON document from a URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, ExplorerError>;
}

/// HTTP JSON client
#[derive(Debug, Clone)]
pub struct HttpJsonClient {
    client: reqwest::Client,
    backoff: backoff::ExponentialBackoff,
}

impl HttpJsonClient {
    /// Create a new client with default timeout and retry settings (exponential backoff)
    pub fn new() -> Result<Self, ExplorerError> {
        Self::with_timeout(HTTP_REQUEST_TIMEOUT)
    }

    /// Create a new client with the given request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, ExplorerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            backoff: backoff::ExponentialBackoff {
                max_elapsed_time: Some(MAX_RETRY_ELAPSED_TIME),
                ..Default::default()
            },
        })
    }

    /// Replace the retry policy
    pub fn with_backoff(mut self, backoff: backoff::ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Client that gives up after the first failed attempt
    pub fn without_retry(timeout: Duration) -> Result<Self, ExplorerError> {
        Ok(Self::with_timeout(timeout)?.with_backoff(backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        }))
    }
}

#[async_trait]
impl JsonFetcher for HttpJsonClient {
    async fn get_json(&self, url: &str) -> Result<Value, ExplorerError> {
        debug!("GET {}", url);
        let client = &self.client;
        request_with_retry(self.backoff.clone(), || async move {
            let response = client
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await?;
            let value = response.error_for_status()?.json::<Value>().await?;
            Ok(value)
        })
        .await
    }
}

/// Execute a request with retry logic using exponential backoff
/// Only transient HTTP failures are retried
async fn request_with_retry<F, Fut, T>(
    backoff: backoff::ExponentialBackoff,
    operation: F,
) -> Result<T, ExplorerError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, ExplorerError>>,
{
    use backoff::{future::retry_notify, Error};

    retry_notify(
        backoff,
        || async {
            match operation().await {
                Ok(result) => Ok(result),
                Err(err) => {
                    if is_retryable_error(&err) {
                        Err(Error::transient(err))
                    } else {
                        Err(Error::permanent(err))
                    }
                }
            }
        },
        |err, duration| {
            info!("Request failed, retrying in {:?}: {}", duration, err);
        },
    )
    .await
}

/// Timeouts, connection failures, server errors and rate limiting are retried
fn is_retryable_error(err: &ExplorerError) -> bool {
    match err {
        ExplorerError::Http(http_err) => {
            if http_err.is_timeout() || http_err.is_connect() {
                return true;
            }
            match http_err.status() {
                Some(status) => {
                    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                }
                None => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_not_retried() {
        let err = ExplorerError::parse("blockstream", "missing vout");
        assert!(!is_retryable_error(&err));
        assert!(!is_retryable_error(&ExplorerError::Unconfirmed("ab".into())));
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let attempts = std::sync::atomic::AtomicUsize::new(0);
        let res: Result<(), ExplorerError> =
            request_with_retry(backoff::ExponentialBackoff::default(), || async {
                attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Err(ExplorerError::Unconfirmed("ab".into()))
            })
            .await;
        assert!(matches!(res, Err(ExplorerError::Unconfirmed(_))));
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
