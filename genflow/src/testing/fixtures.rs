//! Shared fixtures for orchestrator tests.

use crate::core::{Artifact, GroupSpec, Job, Pose};

/// A base input artifact, as uploaded by a user.
#[must_use]
pub fn base_artifact() -> Artifact {
    Artifact::new("base-1", "s3://uploads/base-1.png")
}

/// A reference swatch artifact for a variant group.
#[must_use]
pub fn swatch_artifact(id: &str) -> Artifact {
    Artifact::new(id, format!("s3://swatches/{id}.png"))
}

/// A small job: original + two color groups, three poses.
#[must_use]
pub fn simple_job() -> Job {
    Job::new(
        base_artifact(),
        vec![
            GroupSpec::new("crimson", "Crimson", swatch_artifact("sw-crimson")),
            GroupSpec::new("navy", "Navy", swatch_artifact("sw-navy")),
        ],
        vec![
            Pose::new("front", 0),
            Pose::new("three-quarter-left", -45),
            Pose::new("three-quarter-right", 45),
        ],
    )
}
