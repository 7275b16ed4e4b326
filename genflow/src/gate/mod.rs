//! Pluggable quality gate for derived master artifacts.
//!
//! A group's pose tasks only run once its master has passed the gate. The
//! default gate accepts everything; real acceptance criteria (similarity
//! or color-distance thresholds) belong to the integrator.

use crate::core::{Artifact, GroupSpec};
use async_trait::async_trait;

/// Pass/fail check applied to a group's master before its tasks dispatch.
///
/// Returning `Ok(false)` or `Err(_)` both reject the master and
/// short-circuit the whole group.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QualityGate: Send + Sync {
    /// Evaluates a master artifact for a group.
    async fn evaluate(&self, artifact: &Artifact, group: &GroupSpec) -> anyhow::Result<bool>;
}

/// The default gate: accepts every master.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPassGate;

#[async_trait]
impl QualityGate for AlwaysPassGate {
    async fn evaluate(&self, _artifact: &Artifact, _group: &GroupSpec) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_pass_gate() {
        let gate = AlwaysPassGate;
        let artifact = Artifact::new("m-1", "s3://masters/m-1.png");
        let group = GroupSpec::original();

        let verdict = gate.evaluate(&artifact, &group).await.unwrap();
        assert!(verdict);
    }

    #[tokio::test]
    async fn test_mock_gate_can_reject() {
        let mut gate = MockQualityGate::new();
        gate.expect_evaluate().returning(|_, _| Ok(false));

        let artifact = Artifact::new("m-2", "s3://masters/m-2.png");
        let group = GroupSpec::original();

        let verdict = gate.evaluate(&artifact, &group).await.unwrap();
        assert!(!verdict);
    }
}
