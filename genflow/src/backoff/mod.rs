//! Retry with exponential backoff around one remote call.
//!
//! The controller wraps a single backend operation: transient failures are
//! retried with exponentially growing, cancellable delays; fatal failures
//! propagate immediately. The loop is explicit and bounded, so pathological
//! retry budgets cannot grow the call stack.

use crate::cancellation::CancellationToken;
use crate::errors::{BackendError, GenflowError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = `max_retries + 1`).
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Factor by which the delay grows per retry (1.5 - 2.0).
    pub multiplier: f64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Wall-clock ceiling for one backend call, in milliseconds. Elapse is
    /// classified as a transient timeout.
    pub call_timeout_ms: u64,
    /// Draw each delay uniformly from `0..=delay` to avoid thundering herd.
    pub full_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 30_000,
            call_timeout_ms: 150_000,
            full_jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Sets the growth multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the delay cap.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_call_timeout_ms(mut self, timeout: u64) -> Self {
        self.call_timeout_ms = timeout;
        self
    }

    /// Enables full jitter.
    #[must_use]
    pub fn with_full_jitter(mut self) -> Self {
        self.full_jitter = true;
        self
    }

    /// Total attempts this policy allows.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Computes the delay before retry number `retry_index` (0-based):
    /// `initial_delay * multiplier^retry_index`, capped, then jittered.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, retry_index: usize) -> Duration {
        let factor = self.multiplier.powi(retry_index as i32);
        let ms = (self.initial_delay_ms as f64 * factor) as u64;
        let capped = ms.min(self.max_delay_ms);
        let jittered = if self.full_jitter && capped > 0 {
            rand::thread_rng().gen_range(0..=capped)
        } else {
            capped
        };
        Duration::from_millis(jittered)
    }
}

/// Wraps one remote call with bounded, cancellable retries.
#[derive(Debug, Clone)]
pub struct BackoffController {
    policy: RetryPolicy,
    cancel: Arc<CancellationToken>,
}

impl BackoffController {
    /// Creates a controller from a policy and the job's cancellation token.
    #[must_use]
    pub fn new(policy: RetryPolicy, cancel: Arc<CancellationToken>) -> Self {
        Self { policy, cancel }
    }

    /// Runs `op` until it succeeds, fails fatally, or the retry budget is
    /// exhausted.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, GenflowError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, BackendError>>,
    {
        self.execute_with(op, |_attempt, _delay| {}).await
    }

    /// Like [`execute`](Self::execute), with a hook invoked before every
    /// retry sleep. `attempt` is the 1-based number of the attempt about to
    /// run.
    pub async fn execute_with<T, F, Fut, H>(
        &self,
        mut op: F,
        mut on_retry: H,
    ) -> Result<T, GenflowError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, BackendError>>,
        H: FnMut(usize, Duration),
    {
        let attempts = self.policy.attempts();
        let mut last_err: Option<BackendError> = None;

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled_error());
            }

            let timeout = Duration::from_millis(self.policy.call_timeout_ms);
            let outcome = match tokio::time::timeout(timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::new(format!(
                    "backend call timed out after {}ms",
                    self.policy.call_timeout_ms
                ))),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.policy.delay_for(attempt - 1);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient backend error, retrying"
                    );
                    on_retry(attempt + 1, delay);
                    tokio::select! {
                        () = self.cancel.cancelled() => return Err(self.cancelled_error()),
                        () = tokio::time::sleep(delay) => {}
                    }
                    last_err = Some(e);
                }
                Err(e) if e.is_transient() => {
                    last_err = Some(e);
                }
                Err(e) => return Err(GenflowError::Backend(e)),
            }
        }

        Err(last_err.map_or_else(
            || GenflowError::Internal("retry loop finished without an outcome".to_string()),
            GenflowError::Backend,
        ))
    }

    fn cancelled_error(&self) -> GenflowError {
        GenflowError::Cancelled(self.cancel.reason().unwrap_or_default())
    }
}
