//! Artifact type for generated images.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reference to an image held by the remote backend or object storage.
///
/// Artifacts are opaque to the orchestrator: it moves them between calls
/// (a group's master feeds its pose generations) without ever looking at
/// pixel data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// A unique identifier for the artifact.
    pub id: String,

    /// Where the artifact's bytes live (URL or storage key).
    pub uri: String,

    /// Additional metadata about the artifact.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the artifact was created (RFC3339).
    pub created_at: String,
}

impl Artifact {
    /// Creates a new artifact reference.
    #[must_use]
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            metadata: HashMap::new(),
            created_at: crate::utils::iso_timestamp(),
        }
    }

    /// Adds metadata to the artifact.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
