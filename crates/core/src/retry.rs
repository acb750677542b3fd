//! Bounded retry around single LLM attempts.
//!
//! Each call moves through `Attempting(1) -> ... -> Attempting(n)` and ends in
//! either a decoded value or [`ExhaustedRetries`]. Exhaustion is a value, not an
//! error, so every caller picks its own fallback.

use crate::{
    error::ExhaustedRetries,
    llm_client::{Completion, CompletionRequest, LLMClient},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Attempts per unit of work.
pub const MAX_ATTEMPTS: u32 = 3;
/// Fixed delay between failed attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: RETRY_BACKOFF,
        }
    }
}

/// Result of a retried call.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Success(T),
    Exhausted(ExhaustedRetries),
}

impl<T> CallOutcome<T> {
    /// Returns the value, or the one produced by `fallback` on exhaustion.
    pub fn unwrap_or_else(self, fallback: impl FnOnce(ExhaustedRetries) -> T) -> T {
        match self {
            CallOutcome::Success(value) => value,
            CallOutcome::Exhausted(exhausted) => fallback(exhausted),
        }
    }
}

enum RetryState {
    Attempting(u32),
    Exhausted { attempts: u32, last_error: anyhow::Error },
}

/// Wraps an [`LLMClient`] with the retry state machine.
#[derive(Clone)]
pub struct CompletionClient {
    client: Arc<dyn LLMClient>,
    policy: RetryPolicy,
}

impl CompletionClient {
    pub fn new(client: Arc<dyn LLMClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Runs `request` until `decode` accepts a completion or attempts run out.
    ///
    /// Transport errors and decode errors are treated alike: both fail the
    /// current attempt.
    pub async fn complete_with<T, F>(
        &self,
        label: &str,
        request: CompletionRequest,
        decode: F,
    ) -> CallOutcome<T>
    where
        F: Fn(Completion) -> Result<T>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RetryState::Attempting(1);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    debug!(label, attempt, "Issuing completion request");
                    let result = self.client.complete(request.clone()).await.and_then(&decode);
                    match result {
                        Ok(value) => return CallOutcome::Success(value),
                        Err(error) if attempt < max_attempts => {
                            warn!(
                                label,
                                attempt,
                                max_attempts,
                                error = %error,
                                "Completion attempt failed, retrying"
                            );
                            tokio::time::sleep(self.policy.backoff).await;
                            RetryState::Attempting(attempt + 1)
                        }
                        Err(error) => RetryState::Exhausted {
                            attempts: attempt,
                            last_error: error,
                        },
                    }
                }
                RetryState::Exhausted {
                    attempts,
                    last_error,
                } => {
                    warn!(label, attempts, error = %last_error, "Completion attempts exhausted");
                    return CallOutcome::Exhausted(ExhaustedRetries {
                        attempts,
                        last_error,
                    });
                }
            };
        }
    }

    /// Runs `request` and returns the raw completion.
    pub async fn complete(&self, label: &str, request: CompletionRequest) -> CallOutcome<Completion> {
        self.complete_with(label, request, Ok).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MockLLMClient;
    use anyhow::anyhow;
    use tokio::time::Instant;

    fn request() -> CompletionRequest {
        CompletionRequest::free_text("system", "user")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Ok(Completion::Text("ok".to_string())));

        let client = CompletionClient::new(Arc::new(mock), RetryPolicy::default());
        let outcome = client.complete("test", request()).await;

        match outcome {
            CallOutcome::Success(Completion::Text(text)) => assert_eq!(text, "ok"),
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_before_last_attempt() {
        let mut mock = MockLLMClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_complete()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow!("rate limited")));
        mock.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Completion::Text("third time".to_string())));

        let client = CompletionClient::new(Arc::new(mock), RetryPolicy::default());
        let started = Instant::now();
        let outcome = client.complete("test", request()).await;

        assert!(matches!(outcome, CallOutcome::Success(_)));
        assert_eq!(started.elapsed(), RETRY_BACKOFF * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .times(MAX_ATTEMPTS as usize)
            .returning(|_| Err(anyhow!("service unavailable")));

        let client = CompletionClient::new(Arc::new(mock), RetryPolicy::default());
        let outcome = client.complete("test", request()).await;

        match outcome {
            CallOutcome::Exhausted(exhausted) => {
                assert_eq!(exhausted.attempts, MAX_ATTEMPTS);
                assert!(exhausted.last_error.to_string().contains("service unavailable"));
            }
            other => panic!("Expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_counts_as_attempt() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .times(MAX_ATTEMPTS as usize)
            .returning(|_| Ok(Completion::Text("not json".to_string())));

        let client = CompletionClient::new(Arc::new(mock), RetryPolicy::default());
        let outcome = client
            .complete_with("test", request(), |completion| completion.into_arguments())
            .await;

        assert!(matches!(outcome, CallOutcome::Exhausted(_)));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let mut mock = MockLLMClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(anyhow!("boom")));

        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Duration::ZERO,
        };
        let client = CompletionClient::new(Arc::new(mock), policy);
        let fallback = client
            .complete("test", request())
            .await
            .unwrap_or_else(|exhausted| Completion::Text(format!("{}", exhausted.attempts)));

        assert_eq!(fallback, Completion::Text("1".to_string()));
    }
}
