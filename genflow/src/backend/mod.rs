//! External interface to remote image-synthesis backends.
//!
//! The backend is an opaque collaborator: the orchestrator hands it a
//! payload and gets back an artifact or a [`BackendError`] it can
//! classify. Prompt semantics and image codecs live entirely on the other
//! side of this trait.

use crate::core::{Artifact, OutputFormat};
use crate::errors::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything one remote generation call needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPayload {
    /// Input artifacts (base image, and the reference swatch for master
    /// derivation).
    pub inputs: Vec<Artifact>,
    /// Textual instruction for the backend.
    pub instruction: String,
    /// Output resolution and aspect.
    pub output: OutputFormat,
}

impl GenerationPayload {
    /// Creates a payload from a single input artifact.
    #[must_use]
    pub fn new(input: Artifact, instruction: impl Into<String>, output: OutputFormat) -> Self {
        Self {
            inputs: vec![input],
            instruction: instruction.into(),
            output,
        }
    }

    /// Adds a further input artifact.
    #[must_use]
    pub fn with_input(mut self, input: Artifact) -> Self {
        self.inputs.push(input);
        self
    }
}

/// A remote image-synthesis backend (one tier of the waterfall).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Identifier used in logs and progress messages.
    fn id(&self) -> &str;

    /// Performs one remote generation call.
    async fn generate(&self, payload: &GenerationPayload) -> Result<Artifact, BackendError>;
}
