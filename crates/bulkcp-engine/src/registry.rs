//! Concurrent task store

use crate::task::TaskHandle;
use bulkcp_types::{TaskId, TaskRecord, TaskStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Concurrent-safe store of all task handles, keyed by id.
///
/// The map lock is held only for insert/lookup/remove; per-task state
/// lives behind each handle's own lock and atomics, so readers and
/// workers on different tasks never contend here beyond the map itself.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, Arc<TaskHandle>>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task handle
    pub async fn insert(&self, handle: Arc<TaskHandle>) {
        self.tasks.write().await.insert(handle.id(), handle);
    }

    /// Look up a task handle by id
    pub async fn get(&self, id: TaskId) -> Option<Arc<TaskHandle>> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// Collect every live handle
    pub async fn handles(&self) -> Vec<Arc<TaskHandle>> {
        self.tasks.read().await.values().cloned().collect()
    }

    /// Produce a consistent point-in-time snapshot of all records.
    ///
    /// Handles are collected under the map lock, but the per-task
    /// snapshots are taken after it is released.
    pub async fn snapshot(&self) -> Vec<TaskRecord> {
        let handles = self.handles().await;
        handles.iter().map(|handle| handle.snapshot()).collect()
    }

    /// Remove a task regardless of state.
    ///
    /// Removing a still-active task implicitly cancels it so no orphaned
    /// worker keeps copying for a record nobody can see anymore.
    pub async fn remove(&self, id: TaskId) -> bool {
        let removed = self.tasks.write().await.remove(&id);

        match removed {
            Some(handle) => {
                if !handle.is_terminal() {
                    handle.cancel_token().cancel();
                    handle.try_transition(TaskStatus::Cancelled);
                    debug!("Removed active task {}, cancelling its worker", id);
                } else {
                    debug!("Removed task {}", id);
                }
                true
            }
            None => false,
        }
    }

    /// Remove all tasks in a terminal state, returning how many were
    /// cleared
    pub async fn remove_terminal(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, handle| !handle.is_terminal());
        before - tasks.len()
    }

    /// Number of stored tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Check whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
