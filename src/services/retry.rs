// src/services/retry.rs
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::error::ServiceError;

/// Timeout and bounded-retry rules shared by both hosted API calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub backoff: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout,
            backoff: config.retry_backoff,
            max_retries: 1,
        }
    }

    /// Runs `call` under the timeout. Only retryable failures get another
    /// attempt, and at most `max_retries` of them.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::UpstreamUnavailable(format!(
                    "{operation} timed out after {:?}",
                    self.timeout
                ))),
            };
            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = self.backoff.as_millis() as u64,
                        "retrying after transient error: {e}"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                other => return other,
            }
        }
    }
}
