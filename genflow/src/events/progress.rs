//! Human-readable progress reporting.
//!
//! Progress strings are the only coupling between the orchestrator and a
//! caller-visible UI. Emission is fire-and-forget and must never fail; a
//! sink that does nothing is a valid sink.

use tracing::info;

/// Trait for sinks that receive human-readable progress messages.
pub trait ProgressSink: Send + Sync {
    /// Delivers one progress message. Must not block or fail.
    fn emit(&self, message: &str);
}

/// A no-op sink that discards all progress messages.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn emit(&self, _message: &str) {
        // Intentionally empty - discards all messages
    }
}

/// A sink that forwards progress messages to the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn emit(&self, message: &str) {
        info!(progress = %message, "Progress: {}", message);
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    messages: parking_lot::RwLock<Vec<String>>,
}

impl CollectingProgressSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.read().clone()
    }

    /// Returns the number of collected messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Returns true if no messages have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Clears all collected messages.
    pub fn clear(&self) {
        self.messages.write().clear();
    }

    /// Returns messages containing the given substring.
    #[must_use]
    pub fn messages_containing(&self, needle: &str) -> Vec<String> {
        self.messages
            .read()
            .iter()
            .filter(|m| m.contains(needle))
            .cloned()
            .collect()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn emit(&self, message: &str) {
        self.messages.write().push(message.to_string());
    }
}
