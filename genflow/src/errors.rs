//! Error types for the genflow orchestrator.
//!
//! Remote backend failures are classified into a small taxonomy: transient
//! errors (overload, rate-limit, timeout) are retryable within a tier and
//! escalatable to the fallback tier; everything else is fatal and surfaces
//! immediately.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error returned by a remote generation backend.
///
/// The backend is opaque; all the orchestrator sees is an optional HTTP-ish
/// status code and a message, which [`BackendError::kind`] classifies.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    /// Status code reported by the backend, if any.
    pub status: Option<u16>,
    /// Human-readable failure message.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error from a message alone.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Attaches a status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classifies this error into a [`BackendErrorKind`].
    #[must_use]
    pub fn kind(&self) -> BackendErrorKind {
        classify(self.status, &self.message)
    }

    /// Returns the retry class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        self.kind().class()
    }

    /// Returns true if this error is worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Fine-grained classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// The backend is saturated and shedding load.
    Overloaded,
    /// The caller exceeded its request quota.
    RateLimited,
    /// The call exceeded its wall-clock ceiling.
    Timeout,
    /// The payload was malformed or unprocessable.
    InvalidInput,
    /// The backend's content-safety policy rejected the request.
    ContentPolicy,
    /// Authentication or authorization failed.
    Auth,
    /// Anything the classifier does not recognize.
    Unknown,
}

impl BackendErrorKind {
    /// Maps the kind onto its retry class.
    #[must_use]
    pub fn class(self) -> ErrorClass {
        match self {
            Self::Overloaded | Self::RateLimited | Self::Timeout => ErrorClass::Transient,
            Self::InvalidInput | Self::ContentPolicy | Self::Auth | Self::Unknown => {
                ErrorClass::Fatal
            }
        }
    }
}

/// Coarse retry class of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retryable within a tier and escalatable to the fallback tier.
    Transient,
    /// Never retried; surfaces immediately.
    Fatal,
}

/// Classifies a backend failure by well-known status codes first, then by
/// message substrings.
fn classify(status: Option<u16>, message: &str) -> BackendErrorKind {
    if let Some(code) = status {
        match code {
            429 => return BackendErrorKind::RateLimited,
            503 | 529 => return BackendErrorKind::Overloaded,
            408 | 504 => return BackendErrorKind::Timeout,
            401 | 403 => return BackendErrorKind::Auth,
            400 | 422 => return BackendErrorKind::InvalidInput,
            _ => {}
        }
    }

    let lower = message.to_lowercase();
    if lower.contains("overloaded") || lower.contains("at capacity") {
        BackendErrorKind::Overloaded
    } else if lower.contains("rate limit") || lower.contains("too many requests") {
        BackendErrorKind::RateLimited
    } else if lower.contains("timed out") || lower.contains("timeout") {
        BackendErrorKind::Timeout
    } else if lower.contains("unauthorized") || lower.contains("forbidden") {
        BackendErrorKind::Auth
    } else if lower.contains("safety") || lower.contains("content policy") {
        BackendErrorKind::ContentPolicy
    } else if lower.contains("invalid") || lower.contains("unprocessable") {
        BackendErrorKind::InvalidInput
    } else {
        BackendErrorKind::Unknown
    }
}

/// The main error type for genflow operations.
#[derive(Debug, Error)]
pub enum GenflowError {
    /// A backend call failed (after exhausting any retry budget).
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// Both backend tiers were exhausted.
    ///
    /// Deliberately does not say which tier failed; past this point callers
    /// must not distinguish.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The operation was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// A group's master artifact was rejected by the quality gate.
    #[error("quality gate rejected master for group '{group}': {message}")]
    QualityGate {
        /// The group whose master was rejected.
        group: String,
        /// The gate's rejection message.
        message: String,
    },

    /// A generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_status_code() {
        assert_eq!(
            BackendError::new("nope").with_status(429).kind(),
            BackendErrorKind::RateLimited
        );
        assert_eq!(
            BackendError::new("nope").with_status(503).kind(),
            BackendErrorKind::Overloaded
        );
        assert_eq!(
            BackendError::new("nope").with_status(529).kind(),
            BackendErrorKind::Overloaded
        );
        assert_eq!(
            BackendError::new("nope").with_status(504).kind(),
            BackendErrorKind::Timeout
        );
        assert_eq!(
            BackendError::new("nope").with_status(401).kind(),
            BackendErrorKind::Auth
        );
        assert_eq!(
            BackendError::new("nope").with_status(422).kind(),
            BackendErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_classify_by_message_substring() {
        assert_eq!(
            BackendError::new("Model is overloaded, try later").kind(),
            BackendErrorKind::Overloaded
        );
        assert_eq!(
            BackendError::new("rate limit exceeded").kind(),
            BackendErrorKind::RateLimited
        );
        assert_eq!(
            BackendError::new("request timed out after 150s").kind(),
            BackendErrorKind::Timeout
        );
        assert_eq!(
            BackendError::new("blocked by content policy").kind(),
            BackendErrorKind::ContentPolicy
        );
        assert_eq!(
            BackendError::new("invalid reference image").kind(),
            BackendErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_status_code_wins_over_message() {
        // Message says overloaded, code says bad request: the code decides.
        let err = BackendError::new("overloaded").with_status(400);
        assert_eq!(err.kind(), BackendErrorKind::InvalidInput);
    }

    #[test]
    fn test_unknown_is_fatal() {
        let err = BackendError::new("something odd happened");
        assert_eq!(err.kind(), BackendErrorKind::Unknown);
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_class() {
        assert!(BackendError::new("x").with_status(503).is_transient());
        assert!(BackendError::new("x").with_status(429).is_transient());
        assert!(BackendError::new("timed out").is_transient());
        assert!(!BackendError::new("x").with_status(403).is_transient());
    }

    #[test]
    fn test_genflow_error_display() {
        let err = GenflowError::BackendUnavailable("all capacity busy".to_string());
        assert_eq!(err.to_string(), "backend unavailable: all capacity busy");

        let err = GenflowError::QualityGate {
            group: "crimson".to_string(),
            message: "color distance too large".to_string(),
        };
        assert!(err.to_string().contains("crimson"));
    }
}
