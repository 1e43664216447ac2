use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use tras_models::analysis::{AnalysisRequest, ModelResponse, ResponseStatus};
use tras_models::config::AgentsConfig;

use crate::error::ProviderError;
use crate::prompts::{analysis_prompt, ANALYST_SYSTEM_PROMPT};
use crate::provider::ModelProvider;

/// Bounded retry with exponential backoff and a per-attempt timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AgentsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_seconds),
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AgentsConfig::default())
    }
}

/// Wraps one provider with its own retry state.
///
/// Every outcome comes back as a [`ModelResponse`]; callers never see an
/// error type.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn ModelProvider>,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn ModelProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    /// Ask the provider for trade recommendations on `request`.
    pub async fn call(&self, request: &AnalysisRequest) -> ModelResponse {
        self.complete(ANALYST_SYSTEM_PROMPT, &analysis_prompt(request))
            .await
    }

    /// Run one prompt through the provider, retrying retryable failures.
    pub async fn complete(&self, system: &str, prompt: &str) -> ModelResponse {
        let id = self.provider.id().to_string();
        let start = Instant::now();
        let mut last_error = None;
        let mut attempts = 0;

        for attempt in 1..=self.policy.max_attempts {
            attempts = attempt;
            let outcome =
                tokio::time::timeout(self.policy.attempt_timeout, self.provider.complete(system, prompt))
                    .await;

            let error = match outcome {
                Ok(Ok(text)) => {
                    let latency_ms = start.elapsed().as_millis() as u64;
                    info!(provider = %id, attempt, latency_ms, "Provider call succeeded");
                    return ModelResponse::ok(&id, text, latency_ms, attempt);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.policy.attempt_timeout.as_millis() as u64),
            };

            if !error.is_retryable() {
                warn!(provider = %id, attempt, error = %error, "Permanent provider error, not retrying");
                last_error = Some(error);
                break;
            }

            if attempt < self.policy.max_attempts {
                let delay = match &error {
                    ProviderError::RateLimited {
                        retry_after_secs: Some(secs),
                    } => Duration::from_secs(*secs).min(self.policy.max_delay),
                    _ => self.policy.backoff(attempt),
                };
                warn!(
                    provider = %id,
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            } else {
                debug!(provider = %id, attempt, error = %error, "Final attempt failed");
            }
            last_error = Some(error);
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        let status = match last_error {
            Some(ProviderError::Timeout(_)) => ResponseStatus::TimedOut,
            _ => ResponseStatus::Failed,
        };
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());
        warn!(provider = %id, attempts, error = %detail, "Provider call gave up");
        ModelResponse::failed(&id, status, detail, latency_ms, attempts)
    }
}
