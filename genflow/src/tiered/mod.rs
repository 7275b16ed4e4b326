//! Tiered backend selection: primary first, fallback on saturation.
//!
//! Each tier runs under its own bounded retry budget. A transient final
//! error on the primary (overload, rate-limit, timeout) escalates to the
//! secondary tier; a fatal error propagates without touching the
//! secondary. Once the secondary is also exhausted, callers get one
//! unified "backend unavailable" error and must not distinguish tiers.

use crate::backend::{GenerationBackend, GenerationPayload};
use crate::backoff::{BackoffController, RetryPolicy};
use crate::cancellation::CancellationToken;
use crate::core::Artifact;
use crate::errors::GenflowError;
use crate::events::{NoOpProgressSink, ProgressSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Retry budgets for both tiers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SelectorConfig {
    /// Policy for the primary tier.
    pub primary: RetryPolicy,
    /// Policy for the fallback tier.
    pub secondary: RetryPolicy,
}

/// Runs one generation payload through the tier waterfall.
#[derive(Clone)]
pub struct TieredSelector {
    config: SelectorConfig,
    cancel: Arc<CancellationToken>,
    progress: Arc<dyn ProgressSink>,
}

impl TieredSelector {
    /// Creates a selector with a no-op progress sink.
    #[must_use]
    pub fn new(config: SelectorConfig, cancel: Arc<CancellationToken>) -> Self {
        Self {
            config,
            cancel,
            progress: Arc::new(NoOpProgressSink),
        }
    }

    /// Replaces the progress sink.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Generates an artifact, falling back to `secondary` if `primary`'s
    /// final error is transient.
    pub async fn generate(
        &self,
        primary: &dyn GenerationBackend,
        secondary: &dyn GenerationBackend,
        payload: &GenerationPayload,
    ) -> Result<Artifact, GenflowError> {
        match self.run_tier(primary, payload, &self.config.primary).await {
            Ok(artifact) => Ok(artifact),
            Err(GenflowError::Backend(e)) if e.is_transient() => {
                warn!(
                    backend = primary.id(),
                    error = %e,
                    "Primary tier exhausted, switching to fallback backend"
                );
                self.progress
                    .emit("High demand right now, switching to fast mode");

                match self.run_tier(secondary, payload, &self.config.secondary).await {
                    Ok(artifact) => {
                        info!(backend = secondary.id(), "Fallback tier succeeded");
                        Ok(artifact)
                    }
                    Err(GenflowError::Backend(e2)) if e2.is_transient() => {
                        Err(GenflowError::BackendUnavailable(
                            "all generation capacity is busy, please try again later"
                                .to_string(),
                        ))
                    }
                    Err(other) => Err(other),
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn run_tier(
        &self,
        backend: &dyn GenerationBackend,
        payload: &GenerationPayload,
        policy: &RetryPolicy,
    ) -> Result<Artifact, GenflowError> {
        let controller = BackoffController::new(policy.clone(), self.cancel.clone());
        let attempts = policy.attempts();
        let progress = &self.progress;

        controller
            .execute_with(
                || backend.generate(payload),
                |attempt, _delay| {
                    progress.emit(&format!("Generation queued, attempt {attempt}/{attempts}"));
                },
            )
            .await
    }
}

impl std::fmt::Debug for TieredSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredSelector")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
