//! Bounded-concurrency task dispatch.
//!
//! The executor keeps a set of in-flight generation futures capped at a
//! limit computed once per run. When the set is full it races the in-flight
//! futures and admits the next task as soon as any one of them settles -
//! it never waits for the whole batch. Cancellation stops admission;
//! already-running calls settle on their own, but their status writes are
//! suppressed so they cannot race a cancellation-triggered reset.

mod policy;

pub use policy::{fixed_limit, ConcurrencyPolicy, HourlyLimits};

use crate::cancellation::CancellationToken;
use crate::core::{Artifact, Task, TaskId, TaskStatus};
use crate::errors::GenflowError;
use crate::store::TaskStore;
use chrono::Local;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

type Settlement = (TaskId, Result<Artifact, GenflowError>);

/// Dispatches independent tasks into a bounded pool of workers.
pub struct TaskPoolExecutor {
    store: Arc<TaskStore>,
    cancel: Arc<CancellationToken>,
    policy: ConcurrencyPolicy,
}

impl TaskPoolExecutor {
    /// Creates an executor bound to one job's store and cancellation token.
    #[must_use]
    pub fn new(
        store: Arc<TaskStore>,
        cancel: Arc<CancellationToken>,
        policy: ConcurrencyPolicy,
    ) -> Self {
        Self {
            store,
            cancel,
            policy,
        }
    }

    /// Runs every task through `worker`, at most `limit` at a time.
    ///
    /// The limit is computed from the concurrency policy at the start of
    /// the call and stays fixed for its duration. Tasks not yet admitted
    /// when cancellation fires are left `pending`.
    pub async fn run<W, Fut>(&self, tasks: Vec<Task>, worker: W)
    where
        W: Fn(Task) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Artifact, GenflowError>> + Send + 'static,
    {
        let limit = (self.policy)(Local::now()).max(1);
        debug!(limit, task_count = tasks.len(), "Dispatching task batch");

        let worker = Arc::new(worker);
        let mut in_flight: FuturesUnordered<tokio::task::JoinHandle<Settlement>> =
            FuturesUnordered::new();

        for task in tasks {
            // Race the in-flight set until there is room for one more.
            while in_flight.len() >= limit {
                if let Some(settled) = in_flight.next().await {
                    self.settle(settled);
                }
            }

            if self.cancel.is_cancelled() {
                info!("Cancellation observed, not admitting further tasks");
                break;
            }

            let id = task.id.clone();
            self.store
                .update(&id, TaskStatus::Generating, None, None);

            let worker = worker.clone();
            in_flight.push(tokio::spawn(async move {
                let result = worker(task).await;
                (id, result)
            }));
        }

        while let Some(settled) = in_flight.next().await {
            self.settle(settled);
        }
    }

    /// Writes one settlement back through the store, unless the job was
    /// cancelled in the meantime.
    fn settle(&self, joined: Result<Settlement, tokio::task::JoinError>) {
        let (id, result) = match joined {
            Ok(settlement) => settlement,
            Err(e) => {
                error!(error = %e, "Generation task panicked");
                return;
            }
        };

        if self.cancel.is_cancelled() {
            debug!(task_id = %id, "Settlement after cancellation, suppressing status write");
            return;
        }

        match result {
            Ok(artifact) => {
                self.store
                    .update(&id, TaskStatus::Success, Some(artifact), None);
            }
            Err(e) => {
                self.store
                    .update(&id, TaskStatus::Failed, None, Some(e.to_string()));
            }
        }
    }
}

impl std::fmt::Debug for TaskPoolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPoolExecutor")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn seeded(tasks: &[Task]) -> Arc<TaskStore> {
        let store = Arc::new(TaskStore::new());
        store.seed(tasks.to_vec());
        store
    }

    fn five_tasks() -> Vec<Task> {
        (0..5).map(|i| Task::new("original", format!("pose-{i}"))).collect()
    }

    fn ok_artifact(task: &Task) -> Artifact {
        Artifact::new(format!("img-{}", task.id), format!("mock://{}", task.id))
    }

    #[tokio::test]
    async fn test_all_tasks_reach_terminal_state() {
        let tasks = five_tasks();
        let store = seeded(&tasks);
        let executor = TaskPoolExecutor::new(
            store.clone(),
            Arc::new(CancellationToken::new()),
            fixed_limit(2),
        );

        executor
            .run(tasks, |task| async move { Ok(ok_artifact(&task)) })
            .await;

        let snapshot = store.snapshot();
        assert!(snapshot.iter().all(|t| t.status == TaskStatus::Success));
        assert!(snapshot.iter().all(|t| t.artifact.is_some()));
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let tasks = five_tasks();
        let store = seeded(&tasks);

        // Track the peak number of simultaneously `generating` tasks via
        // the store's own snapshot subscription.
        let peak = Arc::new(AtomicUsize::new(0));
        let p = peak.clone();
        store.subscribe(move |snapshot| {
            let generating = snapshot
                .iter()
                .filter(|t| t.status == TaskStatus::Generating)
                .count();
            p.fetch_max(generating, Ordering::SeqCst);
        });

        let executor = TaskPoolExecutor::new(
            store.clone(),
            Arc::new(CancellationToken::new()),
            fixed_limit(2),
        );

        executor
            .run(tasks, |task| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(ok_artifact(&task))
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_cancel_before_dispatch_leaves_everything_pending() {
        let tasks = five_tasks();
        let store = seeded(&tasks);
        let cancel = Arc::new(CancellationToken::new());
        cancel.cancel("user aborted");

        let executor = TaskPoolExecutor::new(store.clone(), cancel, fixed_limit(2));
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        executor
            .run(tasks, move |task| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(ok_artifact(&task))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store
            .snapshot()
            .iter()
            .all(|t| t.status == TaskStatus::Pending));
    }

    #[tokio::test]
    async fn test_cancel_mid_run_stops_admission_and_suppresses_writes() {
        let tasks = five_tasks();
        let store = seeded(&tasks);
        let cancel = Arc::new(CancellationToken::new());

        let executor = TaskPoolExecutor::new(store.clone(), cancel.clone(), fixed_limit(1));

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(45)).await;
                cancel.cancel("user aborted");
            })
        };

        executor
            .run(tasks, |task| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(ok_artifact(&task))
            })
            .await;
        canceller.await.unwrap();

        let snapshot = store.snapshot();
        // Some tasks were never admitted and stay pending (not failed).
        assert!(snapshot.iter().any(|t| t.status == TaskStatus::Pending));
        assert!(snapshot.iter().all(|t| t.status != TaskStatus::Failed));
    }

    #[tokio::test]
    async fn test_worker_failure_marks_task_failed_without_aborting_siblings() {
        let tasks = five_tasks();
        let store = seeded(&tasks);
        let executor = TaskPoolExecutor::new(
            store.clone(),
            Arc::new(CancellationToken::new()),
            fixed_limit(2),
        );

        executor
            .run(tasks, |task| async move {
                if task.pose_id == "pose-2" {
                    Err(GenflowError::BackendUnavailable(
                        "all capacity busy".to_string(),
                    ))
                } else {
                    Ok(ok_artifact(&task))
                }
            })
            .await;

        let snapshot = store.snapshot();
        let failed: Vec<_> = snapshot
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error.as_deref().unwrap_or("").contains("busy"));
        assert_eq!(
            snapshot
                .iter()
                .filter(|t| t.status == TaskStatus::Success)
                .count(),
            4
        );
    }
}
