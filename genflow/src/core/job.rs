//! Job, group, and pose types.

use super::{Artifact, Task};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh job id.
    #[must_use]
    pub fn new() -> Self {
        Self(crate::utils::generate_uuid())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output-format parameters forwarded to the backend with every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFormat {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Aspect-ratio label the backend understands (e.g. "3:4").
    pub aspect: String,
}

impl OutputFormat {
    /// Creates an output format.
    #[must_use]
    pub fn new(width: u32, height: u32, aspect: impl Into<String>) -> Self {
        Self {
            width,
            height,
            aspect: aspect.into(),
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(1024, 1024, "1:1")
    }
}

/// A camera pose to render: an identifier plus a signed yaw angle.
///
/// Negative yaw turns the camera left of the subject, positive right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pose {
    /// Pose identifier (e.g. "front", "three-quarter-left").
    pub id: String,
    /// Requested rotation around the vertical axis, in degrees.
    pub yaw_degrees: i16,
}

impl Pose {
    /// Creates a pose.
    #[must_use]
    pub fn new(id: impl Into<String>, yaw_degrees: i16) -> Self {
        Self {
            id: id.into(),
            yaw_degrees,
        }
    }
}

/// A variant axis (e.g. a color swap) sharing one derived master artifact.
///
/// A group without a reference artifact is "original": its master is the
/// job's base artifact and no derivation or gate step runs for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Group identifier, unique within the job.
    pub id: String,
    /// Display label (also feeds the master-derivation instruction).
    pub label: String,
    /// Reference artifact the master is derived from, if any.
    pub reference: Option<Artifact>,
}

impl GroupSpec {
    /// Creates a variant group with a reference artifact.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        reference: Artifact,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            reference: Some(reference),
        }
    }

    /// Creates the implicit original group.
    #[must_use]
    pub fn original() -> Self {
        Self {
            id: "original".to_string(),
            label: "Original".to_string(),
            reference: None,
        }
    }

    /// Returns true if this group uses the job's base artifact directly.
    #[must_use]
    pub fn is_original(&self) -> bool {
        self.reference.is_none()
    }
}

/// One user-initiated generation request.
///
/// Immutable once dispatched. The implicit original group is materialized
/// at position 0, so group iteration order is also execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job id.
    pub id: JobId,
    /// The input artifact everything is derived from.
    pub base: Artifact,
    /// Ordered groups, original first.
    pub groups: Vec<GroupSpec>,
    /// Ordered poses rendered for every group.
    pub poses: Vec<Pose>,
    /// Keep variation between renders minimal.
    pub micro_variation: bool,
    /// Target resolution and aspect.
    pub output: OutputFormat,
}

impl Job {
    /// Creates a job from a base artifact, variant groups, and poses.
    ///
    /// The implicit original group is inserted ahead of `variant_groups`.
    #[must_use]
    pub fn new(base: Artifact, variant_groups: Vec<GroupSpec>, poses: Vec<Pose>) -> Self {
        let mut groups = Vec::with_capacity(variant_groups.len() + 1);
        groups.push(GroupSpec::original());
        groups.extend(variant_groups);

        Self {
            id: JobId::new(),
            base,
            groups,
            poses,
            micro_variation: false,
            output: OutputFormat::default(),
        }
    }

    /// Enables micro-variation mode.
    #[must_use]
    pub fn with_micro_variation(mut self, enabled: bool) -> Self {
        self.micro_variation = enabled;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Expands the job into one pending task per (group, pose) pair.
    #[must_use]
    pub fn expand(&self) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.groups.len() * self.poses.len());
        for group in &self.groups {
            for pose in &self.poses {
                tasks.push(Task::new(group.id.clone(), pose.id.clone()));
            }
        }
        tasks
    }
}
