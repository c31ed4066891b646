//! Retry logic for node RPC operations.
//!
//! Transient network failures and 5xx node responses are retried with
//! exponential backoff; configuration errors, reverts, and other permanent
//! failures surface immediately.

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry strategy configuration
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of retries
    pub max_retries: usize,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl RetryStrategy {
    /// Create a retry strategy from the deploy configuration
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            multiplier: config.retry_multiplier,
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Check whether an error is worth retrying
    pub fn is_retryable(error: &DeployError) -> bool {
        match error {
            DeployError::NetworkError(_) => true,
            // Node-side 5xx responses are transient.
            DeployError::RpcError(msg) => {
                msg.contains("500") || msg.contains("502") || msg.contains("503")
            }
            DeployError::InvalidResponse(_) => true,
            // Reverts, config errors, and everything else are permanent.
            _ => false,
        }
    }

    /// Execute an operation, retrying transient failures with backoff
    pub async fn retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(result) => {
                    if attempts > 1 {
                        debug!("Operation succeeded after {} attempts", attempts);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !Self::is_retryable(&error) {
                        return Err(error);
                    }
                    if attempts > self.max_retries {
                        warn!(
                            "Max retries ({}) exceeded. Last error: {:?}",
                            self.max_retries, error
                        );
                        return Err(DeployError::MaxRetriesExceeded(self.max_retries));
                    }

                    let delay = match backoff.next_backoff() {
                        Some(d) => d,
                        None => return Err(DeployError::MaxRetriesExceeded(self.max_retries)),
                    };

                    warn!(
                        "Attempt {} failed: {:?}. Retrying in {:?}",
                        attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use alloy_primitives::Address;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_strategy(max_retries: usize) -> RetryStrategy {
        RetryStrategy {
            max_retries,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_strategy_from_config() {
        let config = DeployConfig::new(Network::Ganache, Address::repeat_byte(0xaa));
        let strategy = RetryStrategy::from_config(&config);
        assert_eq!(strategy.max_retries, config.max_retries);
        assert_eq!(
            strategy.initial_delay,
            Duration::from_millis(config.retry_initial_delay_ms)
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(RetryStrategy::is_retryable(&DeployError::RpcError(
            "HTTP 503: unavailable".to_string()
        )));
        assert!(RetryStrategy::is_retryable(&DeployError::InvalidResponse(
            "truncated".to_string()
        )));
        assert!(!RetryStrategy::is_retryable(&DeployError::Reverted {
            reason: "NOT_PAUSER".to_string()
        }));
        assert!(!RetryStrategy::is_retryable(&DeployError::UnknownNetwork(
            "hardhat".to_string()
        )));
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result = fast_strategy(3)
            .retry(|| async {
                if counter_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DeployError::InvalidResponse("flaky".to_string()))
                } else {
                    Ok(7u32)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<u32> = fast_strategy(2)
            .retry(|| async {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Err(DeployError::InvalidResponse("down".to_string()))
            })
            .await;

        assert_matches!(result, Err(DeployError::MaxRetriesExceeded(2)));
        assert_eq!(counter.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let result: Result<u32> = fast_strategy(3)
            .retry(|| async {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Err(DeployError::Reverted {
                    reason: "CACHE_ALREADY_EXISTS".to_string(),
                })
            })
            .await;

        assert_matches!(result, Err(DeployError::Reverted { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
