//! Exponential backoff around a [`CompletionClient`].
//!
//! Only rate-limit failures are retried. Every other failure is returned
//! on the attempt that produced it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::error::LlmError;
use super::{Completion, CompletionClient};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every following retry
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Attempt cap, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before retrying after the given zero-based attempt:
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Whether a failure on the given zero-based attempt earns another try.
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        error.is_rate_limited() && attempt + 1 < self.attempts()
    }
}

/// Wraps a client and retries rate-limited calls with exponential backoff.
pub struct RetryingClient {
    inner: Arc<dyn CompletionClient>,
    config: RetryConfig,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn CompletionClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl CompletionClient for RetryingClient {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let start = Instant::now();
        let max_attempts = self.config.attempts();
        let mut attempt = 0;

        loop {
            match self.inner.generate(prompt).await {
                Ok(completion) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(completion);
                }
                Err(error) if self.config.should_retry(&error, attempt) => {
                    let delay = self.config.delay_for(attempt);
                    tracing::warn!(
                        "Rate limited, waiting {:?} before retry {}/{}: {}",
                        delay,
                        attempt + 1,
                        max_attempts,
                        error.message
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    if attempt > 0 {
                        tracing::error!(
                            "Request failed after {} retries (total time: {:?}): {}",
                            attempt,
                            start.elapsed(),
                            error
                        );
                    } else {
                        tracing::error!("Request failed (non-retryable): {}", error);
                    }
                    return Err(error);
                }
            }
        }
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Replays a fixed script of outcomes, then keeps repeating the last one.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().await;
            let next = if outcomes.len() > 1 {
                outcomes.pop_front()
            } else {
                outcomes.front().cloned()
            };
            next.expect("script must not be empty").map(Completion::from_text)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn throttled() -> Result<String, LlmError> {
        Err(LlmError::network_error(
            "[429 Too Many Requests] Resource has been exhausted".to_string(),
        ))
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_secs(1));
        assert_eq!(config.delay_for(1), Duration::from_secs(2));
        assert_eq!(config.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryConfig::new(0).attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_rate_limits() {
        let upstream = Scripted::new(vec![throttled(), throttled(), Ok("done".to_string())]);
        let client = RetryingClient::new(upstream.clone(), RetryConfig::default());

        let started = tokio::time::Instant::now();
        let completion = client.generate("prompt").await.unwrap();

        assert_eq!(completion.text, "done");
        assert_eq!(upstream.calls(), 3);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_attempt_cap() {
        let upstream = Scripted::new(vec![throttled()]);
        let client = RetryingClient::new(upstream.clone(), RetryConfig::new(3));

        let err = client.generate("prompt").await.unwrap_err();

        assert!(err.message.contains("429"));
        assert_eq!(upstream.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_failure_is_not_retried() {
        let upstream = Scripted::new(vec![
            Err(LlmError::server_error(500, "Internal error".to_string())),
            Ok("never reached".to_string()),
        ]);
        let client = RetryingClient::new(upstream.clone(), RetryConfig::default());

        let started = tokio::time::Instant::now();
        let err = client.generate("prompt").await.unwrap_err();

        assert_eq!(err.message, "Internal error");
        assert_eq!(upstream.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_makes_single_call() {
        let upstream = Scripted::new(vec![Ok("hi".to_string())]);
        let client = RetryingClient::new(upstream.clone(), RetryConfig::default());

        client.generate("prompt").await.unwrap();
        assert_eq!(upstream.calls(), 1);
    }
}
