//! Shared test utilities for bulkcp integration tests

#![deny(missing_docs)]

use bulkcp_engine::TaskManager;
use bulkcp_types::{TaskId, TaskRecord, TaskStatus};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Generate deterministic test data with some structure.
///
/// Cheap arithmetic rather than a RNG, so runs are reproducible and
/// generating multi-megabyte fixtures stays fast in debug builds.
pub fn generate_test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    for i in 0..size {
        data.push(((i * 7 + 13) % 256) as u8);
    }
    data
}

/// Create a file with deterministic content of the given size
pub fn create_test_file(temp_dir: &TempDir, name: &str, size: usize) -> PathBuf {
    let path = temp_dir.path().join(name);
    std::fs::write(&path, generate_test_data(size)).expect("Failed to write test file");
    path
}

/// Create the mixed directory tree used by the tree scenarios:
/// three files (1KB, 2KB, 0 bytes) plus one empty subdirectory.
pub fn create_mixed_tree(base: &Path) {
    std::fs::create_dir_all(base).expect("Failed to create tree root");
    std::fs::create_dir_all(base.join("empty")).expect("Failed to create empty subdir");
    std::fs::write(base.join("one.bin"), generate_test_data(1024)).unwrap();
    std::fs::write(base.join("two.bin"), generate_test_data(2048)).unwrap();
    std::fs::write(base.join("zero.bin"), b"").unwrap();
}

/// Poll a task until it reaches a terminal state, panicking after the
/// timeout
pub async fn wait_for_terminal(
    manager: &TaskManager,
    id: TaskId,
    timeout: Duration,
) -> TaskRecord {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(record) = manager.get_task(id).await {
            if record.status.is_terminal() {
                return record;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("task {id} did not reach a terminal state within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll a task until a predicate on its record holds, panicking after
/// the timeout
pub async fn wait_for<F>(
    manager: &TaskManager,
    id: TaskId,
    timeout: Duration,
    mut predicate: F,
) -> TaskRecord
where
    F: FnMut(&TaskRecord) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(record) = manager.get_task(id).await {
            if predicate(&record) {
                return record;
            }
            if record.status.is_terminal() {
                panic!("task {id} went terminal ({}) before the condition held", record.status);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition for task {id} did not hold within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Poll a task until it reports the given status
pub async fn wait_for_status(
    manager: &TaskManager,
    id: TaskId,
    status: TaskStatus,
    timeout: Duration,
) -> TaskRecord {
    wait_for(manager, id, timeout, |record| record.status == status).await
}
