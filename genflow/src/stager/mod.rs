//! Staged execution of one generation job.
//!
//! The stager owns the dependency structure the pool cannot see: a group's
//! pose tasks may only run once that group's master artifact exists and
//! has passed the quality gate. Groups run strictly one after another to
//! cap total load on the remote backend; poses within a group run
//! concurrently under the pool's limit.

mod prompts;

pub use prompts::{clamp_yaw, master_instruction, pose_instruction, MAX_YAW_DEGREES};


use crate::backend::{GenerationBackend, GenerationPayload};
use crate::context::JobContext;
use crate::core::{Artifact, GroupSpec, Job, Pose, Task, TaskStatus};
use crate::errors::GenflowError;
use crate::gate::{AlwaysPassGate, QualityGate};
use crate::pool::{ConcurrencyPolicy, HourlyLimits, TaskPoolExecutor};
use crate::tiered::{SelectorConfig, TieredSelector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Final tallies for a finished (or cancelled) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobSummary {
    /// Total number of tasks.
    pub total: usize,
    /// Tasks that produced an artifact.
    pub succeeded: usize,
    /// Tasks that ended with an error.
    pub failed: usize,
    /// Tasks still non-terminal (only possible after cancellation).
    pub pending: usize,
}

impl JobSummary {
    /// Tallies a task snapshot.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut summary = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Success => summary.succeeded += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Pending | TaskStatus::Generating => summary.pending += 1,
            }
        }
        summary
    }
}

/// Orchestrates a whole job: expansion, master derivation, gating, and
/// pose dispatch.
pub struct PipelineStager {
    primary: Arc<dyn GenerationBackend>,
    secondary: Arc<dyn GenerationBackend>,
    gate: Arc<dyn QualityGate>,
    selector_config: SelectorConfig,
    concurrency: ConcurrencyPolicy,
}

impl PipelineStager {
    /// Creates a stager over a primary and a fallback backend, with the
    /// default gate, retry budgets, and hour-based concurrency schedule.
    #[must_use]
    pub fn new(
        primary: Arc<dyn GenerationBackend>,
        secondary: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            primary,
            secondary,
            gate: Arc::new(AlwaysPassGate),
            selector_config: SelectorConfig::default(),
            concurrency: HourlyLimits::default().into_policy(),
        }
    }

    /// Replaces the quality gate.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn QualityGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replaces the per-tier retry budgets.
    #[must_use]
    pub fn with_selector_config(mut self, config: SelectorConfig) -> Self {
        self.selector_config = config;
        self
    }

    /// Replaces the concurrency policy.
    #[must_use]
    pub fn with_concurrency(mut self, policy: ConcurrencyPolicy) -> Self {
        self.concurrency = policy;
        self
    }

    /// Runs a job to completion.
    ///
    /// Returns once every group has been processed or cancellation was
    /// observed. There is no job-level failure: the summary reports how
    /// many tasks ended in each state, and per-task errors live in the
    /// store. Dropping the [`JobContext`] after this returns releases
    /// everything the job held.
    pub async fn run_job(&self, job: &Job, ctx: &JobContext) -> JobSummary {
        ctx.store.seed(job.expand());
        info!(
            job_id = %ctx.job_id,
            groups = job.groups.len(),
            poses = job.poses.len(),
            "Job expanded"
        );

        let selector = TieredSelector::new(self.selector_config.clone(), ctx.cancel.clone())
            .with_progress(ctx.progress.clone());
        let pool = TaskPoolExecutor::new(
            ctx.store.clone(),
            ctx.cancel.clone(),
            self.concurrency.clone(),
        );
        let pose_index: Arc<HashMap<String, Pose>> = Arc::new(
            job.poses
                .iter()
                .map(|p| (p.id.clone(), p.clone()))
                .collect(),
        );

        for group in &job.groups {
            if ctx.cancel.is_cancelled() {
                info!(job_id = %ctx.job_id, "Cancellation observed, skipping remaining groups");
                break;
            }

            let master = match self.resolve_master(job, group, ctx, &selector).await {
                MasterOutcome::Ready(master) => master,
                MasterOutcome::GroupFailed => continue,
                MasterOutcome::Cancelled => break,
            };

            let tasks: Vec<Task> = ctx
                .store
                .snapshot()
                .into_iter()
                .filter(|t| t.group_id == group.id && t.status == TaskStatus::Pending)
                .collect();

            let worker = {
                let selector = selector.clone();
                let primary = self.primary.clone();
                let secondary = self.secondary.clone();
                let master = master.clone();
                let output = job.output.clone();
                let micro_variation = job.micro_variation;
                let pose_index = pose_index.clone();
                move |task: Task| {
                    let selector = selector.clone();
                    let primary = primary.clone();
                    let secondary = secondary.clone();
                    let master = master.clone();
                    let output = output.clone();
                    let pose_index = pose_index.clone();
                    async move {
                        let Some(pose) = pose_index.get(&task.pose_id).cloned() else {
                            return Err(GenflowError::Internal(format!(
                                "unknown pose '{}'",
                                task.pose_id
                            )));
                        };
                        let payload = GenerationPayload::new(
                            master,
                            pose_instruction(&pose, micro_variation),
                            output,
                        );
                        selector
                            .generate(primary.as_ref(), secondary.as_ref(), &payload)
                            .await
                    }
                }
            };

            pool.run(tasks, worker).await;
        }

        let summary = JobSummary::from_tasks(&ctx.store.snapshot());
        info!(
            job_id = %ctx.job_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            pending = summary.pending,
            "Job finished"
        );
        summary
    }

    /// Produces the master artifact for a group, gating derived masters.
    async fn resolve_master(
        &self,
        job: &Job,
        group: &GroupSpec,
        ctx: &JobContext,
        selector: &TieredSelector,
    ) -> MasterOutcome {
        let Some(reference) = &group.reference else {
            // Original-style group: the base artifact is the master and
            // needs no derivation or gate.
            return MasterOutcome::Ready(job.base.clone());
        };

        ctx.progress
            .emit(&format!("Preparing the {} variant", group.label));
        debug!(job_id = %ctx.job_id, group = %group.id, "Deriving master artifact");

        let payload = GenerationPayload::new(
            job.base.clone(),
            master_instruction(group, &job.output),
            job.output.clone(),
        )
        .with_input(reference.clone());

        let master = match selector
            .generate(self.primary.as_ref(), self.secondary.as_ref(), &payload)
            .await
        {
            Ok(master) => master,
            Err(GenflowError::Cancelled(_)) => return MasterOutcome::Cancelled,
            Err(e) => {
                self.fail_group(
                    ctx,
                    group,
                    &format!("could not derive the '{}' master: {e}", group.label),
                );
                return MasterOutcome::GroupFailed;
            }
        };

        match self.gate.evaluate(&master, group).await {
            Ok(true) => MasterOutcome::Ready(master),
            Ok(false) => {
                self.fail_group(
                    ctx,
                    group,
                    &format!("master for '{}' was rejected by the quality gate", group.label),
                );
                MasterOutcome::GroupFailed
            }
            Err(e) => {
                self.fail_group(
                    ctx,
                    group,
                    &format!("quality gate failed for '{}': {e}", group.label),
                );
                MasterOutcome::GroupFailed
            }
        }
    }

    /// Short-circuits a whole group: every one of its tasks fails with the
    /// same message, so the caller can render one coherent reason.
    fn fail_group(&self, ctx: &JobContext, group: &GroupSpec, message: &str) {
        warn!(job_id = %ctx.job_id, group = %group.id, reason = %message, "Short-circuiting group");
        let ids: Vec<_> = ctx
            .store
            .snapshot()
            .into_iter()
            .filter(|t| t.group_id == group.id)
            .map(|t| t.id)
            .collect();
        for id in ids {
            ctx.store
                .update(&id, TaskStatus::Failed, None, Some(message.to_string()));
        }
    }
}

impl std::fmt::Debug for PipelineStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStager")
            .field("primary", &self.primary.id())
            .field("secondary", &self.secondary.id())
            .finish()
    }
}

enum MasterOutcome {
    /// Master is ready; dispatch the group's pose tasks with it.
    Ready(Artifact),
    /// Derivation or the gate failed; the group was short-circuited.
    GroupFailed,
    /// Cancellation fired mid-derivation; stop the whole job.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_tasks() {
        let mut tasks = vec![
            Task::new("original", "front"),
            Task::new("original", "back"),
            Task::new("crimson", "front"),
            Task::new("crimson", "back"),
        ];
        tasks[0].status = TaskStatus::Success;
        tasks[1].status = TaskStatus::Failed;
        tasks[2].status = TaskStatus::Generating;

        let summary = JobSummary::from_tasks(&tasks);
        assert_eq!(
            summary,
            JobSummary {
                total: 4,
                succeeded: 1,
                failed: 1,
                pending: 2,
            }
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(JobSummary::from_tasks(&[]), JobSummary::default());
    }
}
