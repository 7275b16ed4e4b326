//! Single-writer task state store with full-snapshot subscriptions.
//!
//! The store is pure bookkeeping: no retry, no scheduling, no backend
//! knowledge. Every component reports status changes through
//! [`TaskStore::update`], and every mutation delivers the entire current
//! task array to each subscriber - consumers get repeated full snapshots,
//! never diffs.

use crate::core::{Artifact, Task, TaskId, TaskStatus};
use parking_lot::RwLock;
use tracing::warn;

/// Callback receiving the full task array after every mutation.
pub type TaskSubscriber = Box<dyn Fn(&[Task]) + Send + Sync>;

/// Holds one job's task array and its subscribers.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<Vec<Task>>,
    subscribers: RwLock<Vec<TaskSubscriber>>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the task array with a freshly expanded job and notifies.
    pub fn seed(&self, tasks: Vec<Task>) {
        *self.tasks.write() = tasks;
        self.notify();
    }

    /// Registers a subscriber.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&[Task]) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(subscriber));
    }

    /// Writes a task's status (and artifact/error) and notifies.
    ///
    /// Terminal writes land unconditionally so a settlement always
    /// overwrites a prior `generating` write. A non-terminal write over a
    /// terminal state is ignored: nothing resurrects a finished task.
    pub fn update(
        &self,
        id: &TaskId,
        status: TaskStatus,
        artifact: Option<Artifact>,
        error: Option<String>,
    ) {
        {
            let mut tasks = self.tasks.write();
            let Some(task) = tasks.iter_mut().find(|t| &t.id == id) else {
                warn!(task_id = %id, "Update for unknown task ignored");
                return;
            };

            if task.status.is_terminal() && !status.is_terminal() {
                warn!(
                    task_id = %id,
                    current = %task.status,
                    attempted = %status,
                    "Ignoring non-terminal write over terminal task"
                );
                return;
            }

            task.status = status;
            task.artifact = artifact;
            task.error = error;
        }
        self.notify();
    }

    /// Returns a copy of the current task array.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    /// Looks up one task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().iter().find(|t| &t.id == id).cloned()
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Returns true if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    fn notify(&self) {
        let snapshot = self.tasks.read().clone();
        for subscriber in self.subscribers.read().iter() {
            subscriber(&snapshot);
        }
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("task_count", &self.len())
            .field("subscriber_count", &self.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn seeded_store() -> TaskStore {
        let store = TaskStore::new();
        store.seed(vec![Task::new("original", "front"), Task::new("original", "back")]);
        store
    }

    #[test]
    fn test_seed_and_snapshot() {
        let store = seeded_store();
        let tasks = store.snapshot();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn test_update_writes_through() {
        let store = seeded_store();
        let id = TaskId::new("original", "front");

        store.update(&id, TaskStatus::Generating, None, None);
        assert_eq!(store.get(&id).unwrap().status, TaskStatus::Generating);

        let artifact = Artifact::new("img-1", "s3://renders/img-1.png");
        store.update(&id, TaskStatus::Success, Some(artifact), None);

        let task = store.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Success);
        assert_eq!(task.artifact.unwrap().id, "img-1");
    }

    #[test]
    fn test_terminal_write_overwrites_generating() {
        let store = seeded_store();
        let id = TaskId::new("original", "front");

        store.update(&id, TaskStatus::Generating, None, None);
        store.update(&id, TaskStatus::Failed, None, Some("boom".to_string()));

        let task = store.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_state_is_never_downgraded() {
        let store = seeded_store();
        let id = TaskId::new("original", "front");

        store.update(
            &id,
            TaskStatus::Success,
            Some(Artifact::new("img-1", "s3://renders/img-1.png")),
            None,
        );
        // A stale, superseded attempt tries to mark it generating again.
        store.update(&id, TaskStatus::Generating, None, None);

        let task = store.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Success);
        assert!(task.artifact.is_some());
    }

    #[test]
    fn test_update_is_idempotent() {
        let store = seeded_store();
        let id = TaskId::new("original", "back");

        store.update(&id, TaskStatus::Failed, None, Some("no capacity".to_string()));
        let first = store.snapshot();

        store.update(&id, TaskStatus::Failed, None, Some("no capacity".to_string()));
        let second = store.snapshot();

        let summary = |tasks: &[Task]| {
            tasks
                .iter()
                .map(|t| (t.id.clone(), t.status, t.error.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn test_unknown_task_is_ignored() {
        let store = seeded_store();
        let before = store.snapshot().len();
        store.update(
            &TaskId::new("ghost", "front"),
            TaskStatus::Failed,
            None,
            None,
        );
        assert_eq!(store.snapshot().len(), before);
    }

    #[test]
    fn test_subscriber_gets_full_snapshot_after_every_mutation() {
        let store = seeded_store();
        let calls = Arc::new(AtomicUsize::new(0));
        let last_len = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        let l = last_len.clone();
        store.subscribe(move |tasks| {
            c.fetch_add(1, Ordering::SeqCst);
            l.store(tasks.len(), Ordering::SeqCst);
        });

        let id = TaskId::new("original", "front");
        store.update(&id, TaskStatus::Generating, None, None);
        store.update(&id, TaskStatus::Success, None, None);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Always the whole array, not a diff.
        assert_eq!(last_len.load(Ordering::SeqCst), 2);
    }
}
