//! Task type and status state machine.

use super::Artifact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a task.
///
/// Lifecycle: `pending` -> `generating` -> `success` | `failed`.
/// Terminal states are never exited; a retry re-uses the same task id
/// rather than creating a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet dispatched into the pool.
    Pending,
    /// Dispatched; a remote call is in flight (possibly retrying).
    Generating,
    /// Finished with an artifact.
    Success,
    /// Finished with an error message.
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Generating => write!(f, "generating"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl TaskStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Composite task identifier: `group-pose`.
///
/// Unique within a job because there is exactly one task per
/// (group, pose) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Builds the id for a (group, pose) pair.
    #[must_use]
    pub fn new(group_id: &str, pose_id: &str) -> Self {
        Self(format!("{group_id}-{pose_id}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The atomic unit of work: one (group, pose) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Composite id (`group-pose`).
    pub id: TaskId,
    /// The group this task belongs to.
    pub group_id: String,
    /// The pose this task renders.
    pub pose_id: String,
    /// Current status.
    pub status: TaskStatus,
    /// Result artifact, populated on success.
    pub artifact: Option<Artifact>,
    /// Error message, populated on failure.
    pub error: Option<String>,
}

impl Task {
    /// Creates a pending task for a (group, pose) pair.
    #[must_use]
    pub fn new(group_id: impl Into<String>, pose_id: impl Into<String>) -> Self {
        let group_id = group_id.into();
        let pose_id = pose_id.into();
        Self {
            id: TaskId::new(&group_id, &pose_id),
            group_id,
            pose_id,
            status: TaskStatus::Pending,
            artifact: None,
            error: None,
        }
    }
}
