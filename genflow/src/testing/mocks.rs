//! Mock backends for testing.

use crate::backend::{GenerationBackend, GenerationPayload};
use crate::core::Artifact;
use crate::errors::BackendError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// A backend that replays a scripted queue of responses, then succeeds.
///
/// Once the queue is drained, every further call returns a fresh artifact
/// whose id is `<backend-id>-<call-number>`.
#[derive(Debug)]
pub struct ScriptedBackend {
    id: String,
    script: Mutex<VecDeque<Result<Artifact, BackendError>>>,
    calls: Mutex<usize>,
}

impl ScriptedBackend {
    /// Creates a backend with an empty script (always succeeds).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
        }
    }

    /// Queues one scripted response.
    pub fn enqueue(&self, response: Result<Artifact, BackendError>) {
        self.script.lock().push_back(response);
    }

    /// Queues `n` copies of an error.
    pub fn enqueue_errors(&self, error: &BackendError, n: usize) {
        let mut script = self.script.lock();
        for _ in 0..n {
            script.push_back(Err(error.clone()));
        }
    }

    /// Returns how many times the backend was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, _payload: &GenerationPayload) -> Result<Artifact, BackendError> {
        let n = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };
        if let Some(response) = self.script.lock().pop_front() {
            return response;
        }
        Ok(Artifact::new(
            format!("{}-{}", self.id, n),
            format!("mock://{}/{}", self.id, n),
        ))
    }
}

/// A backend that always returns the same error.
#[derive(Debug)]
pub struct FailingBackend {
    id: String,
    error: BackendError,
    calls: Mutex<usize>,
}

impl FailingBackend {
    /// Creates a backend that fails every call with `error`.
    #[must_use]
    pub fn new(id: impl Into<String>, error: BackendError) -> Self {
        Self {
            id: id.into(),
            error,
            calls: Mutex::new(0),
        }
    }

    /// Returns how many times the backend was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, _payload: &GenerationPayload) -> Result<Artifact, BackendError> {
        *self.calls.lock() += 1;
        Err(self.error.clone())
    }
}

/// A backend that sleeps before succeeding, for concurrency tests.
#[derive(Debug)]
pub struct SlowBackend {
    id: String,
    delay: Duration,
    calls: Mutex<usize>,
}

impl SlowBackend {
    /// Creates a backend that succeeds after `delay`.
    #[must_use]
    pub fn new(id: impl Into<String>, delay: Duration) -> Self {
        Self {
            id: id.into(),
            delay,
            calls: Mutex::new(0),
        }
    }

    /// Returns how many times the backend was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl GenerationBackend for SlowBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, _payload: &GenerationPayload) -> Result<Artifact, BackendError> {
        let n = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };
        tokio::time::sleep(self.delay).await;
        Ok(Artifact::new(
            format!("{}-{}", self.id, n),
            format!("mock://{}/{}", self.id, n),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutputFormat;

    fn payload() -> GenerationPayload {
        GenerationPayload::new(
            Artifact::new("base", "s3://uploads/base.png"),
            "render",
            OutputFormat::default(),
        )
    }

    #[tokio::test]
    async fn test_scripted_backend_replays_then_succeeds() {
        let backend = ScriptedBackend::new("pro");
        backend.enqueue(Err(BackendError::new("overloaded")));

        assert!(backend.generate(&payload()).await.is_err());
        let artifact = backend.generate(&payload()).await.unwrap();
        assert_eq!(artifact.id, "pro-2");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_backend_always_fails() {
        let backend = FailingBackend::new("pro", BackendError::new("overloaded"));
        assert!(backend.generate(&payload()).await.is_err());
        assert!(backend.generate(&payload()).await.is_err());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_slow_backend_eventually_succeeds() {
        let backend = SlowBackend::new("fast", Duration::from_millis(5));
        let artifact = backend.generate(&payload()).await.unwrap();
        assert_eq!(artifact.id, "fast-1");
    }
}
