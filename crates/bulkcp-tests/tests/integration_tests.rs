//! End-to-end scenarios for the copy task manager
//!
//! These tests drive the engine the way a client would: create tasks,
//! watch their records, and exercise the control surface while copies
//! are in flight.

use bulkcp_engine::{CopyRequest, ManagerConfig, TaskManager};
use bulkcp_tests::{
    create_mixed_tree, create_test_file, generate_test_data, wait_for, wait_for_status,
    wait_for_terminal,
};
use bulkcp_types::TaskStatus;
use std::time::Duration;
use tempfile::TempDir;

const TERMINAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Manager tuned for tests that need many progress ticks: tiny chunks
/// give cancellation and pause a fine-grained copy loop to interrupt.
fn small_chunk_manager() -> TaskManager {
    TaskManager::new(ManagerConfig {
        chunk_size: 4096,
        ..ManagerConfig::default()
    })
}

#[tokio::test]
async fn scenario_single_file_to_directory() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "payload.bin", 10 * 1024 * 1024);
    let dest = temp_dir.path().join("dest");
    tokio::fs::create_dir(&dest).await.unwrap();

    let manager = TaskManager::new(ManagerConfig::default());
    let id = manager
        .create_task(CopyRequest::single(&source, &dest))
        .await
        .unwrap();

    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.copied_bytes, 10 * 1024 * 1024);
    assert_eq!(record.total_bytes, 10 * 1024 * 1024);
    assert_eq!(record.progress, 100.0);

    let copied = tokio::fs::read(dest.join("payload.bin")).await.unwrap();
    assert_eq!(copied, generate_test_data(10 * 1024 * 1024));
}

#[tokio::test]
async fn scenario_directory_tree_with_empty_subdir() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("tree");
    create_mixed_tree(&source);
    let dest = temp_dir.path().join("dest");
    tokio::fs::create_dir(&dest).await.unwrap();

    let manager = TaskManager::new(ManagerConfig::default());
    let id = manager
        .create_task(CopyRequest::single(&source, &dest))
        .await
        .unwrap();

    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Completed);
    // Three files; the empty subdirectory is structure, not an item.
    assert_eq!(record.total_items, 3);
    assert_eq!(record.copied_items, 3);
    assert_eq!(record.copied_bytes, 3072);

    // Copying into an existing directory nests the tree under its name.
    let root = dest.join("tree");
    assert_eq!(
        tokio::fs::read(root.join("one.bin")).await.unwrap(),
        generate_test_data(1024)
    );
    assert_eq!(
        tokio::fs::read(root.join("two.bin")).await.unwrap(),
        generate_test_data(2048)
    );
    assert_eq!(
        tokio::fs::metadata(root.join("zero.bin")).await.unwrap().len(),
        0
    );
    assert!(root.join("empty").is_dir());
}

#[tokio::test]
async fn scenario_cancel_mid_copy() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "large.bin", 64 * 1024 * 1024);
    let dest = temp_dir.path().join("large-copy.bin");

    let manager = small_chunk_manager();
    let id = manager
        .create_task(CopyRequest::single(&source, &dest))
        .await
        .unwrap();

    // Wait for the copy to be visibly in flight, then cancel.
    wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
        record.status == TaskStatus::Running && record.copied_bytes > 0
    })
    .await;
    assert!(manager.cancel(id).await);

    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Cancelled);
    assert!(record.ended_at.is_some());
    assert!(record.copied_bytes < record.total_bytes);

    // The record stays visible until explicitly removed.
    assert!(manager.get_task(id).await.is_some());
}

#[tokio::test]
async fn scenario_missing_source_fails() {
    let temp_dir = TempDir::new().unwrap();

    let manager = TaskManager::new(ManagerConfig::default());
    let id = manager
        .create_task(CopyRequest::single(
            temp_dir.path().join("does-not-exist.bin"),
            temp_dir.path().join("out.bin"),
        ))
        .await
        .unwrap();

    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.ended_at.is_some());
    let error = record.last_error.expect("failed task must carry an error");
    assert!(error.contains("not found"), "unexpected error: {error}");
}

#[tokio::test]
async fn scenario_pause_on_finished_task_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "quick.bin", 1024);

    let manager = TaskManager::new(ManagerConfig::default());
    let id = manager
        .create_task(CopyRequest::single(&source, temp_dir.path().join("quick-copy.bin")))
        .await
        .unwrap();
    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Completed);

    assert!(!manager.pause(id).await);
    assert_eq!(
        manager.get_task(id).await.unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn pause_freezes_progress_and_resume_finishes() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "pausable.bin", 32 * 1024 * 1024);
    let dest = temp_dir.path().join("pausable-copy.bin");

    let manager = small_chunk_manager();
    let id = manager
        .create_task(CopyRequest::single(&source, &dest))
        .await
        .unwrap();

    wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
        record.status == TaskStatus::Running && record.copied_bytes > 0
    })
    .await;
    assert!(manager.pause(id).await);

    // Allow the in-flight chunk to land, then verify the counters have
    // stopped advancing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let first = manager.get_task(id).await.unwrap();
    assert_eq!(first.status, TaskStatus::Paused);
    tokio::time::sleep(Duration::from_millis(250)).await;
    let second = manager.get_task(id).await.unwrap();
    assert_eq!(second.copied_bytes, first.copied_bytes);
    assert!(second.copied_bytes < second.total_bytes);

    assert!(manager.resume(id).await);
    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(record.copied_bytes, record.total_bytes);

    let copied = tokio::fs::read(&dest).await.unwrap();
    assert_eq!(copied, generate_test_data(32 * 1024 * 1024));
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "cancel-me.bin", 32 * 1024 * 1024);

    let manager = small_chunk_manager();
    let id = manager
        .create_task(CopyRequest::single(&source, temp_dir.path().join("out.bin")))
        .await
        .unwrap();

    wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
        record.copied_bytes > 0
    })
    .await;

    assert!(manager.cancel(id).await);
    let first = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(first.status, TaskStatus::Cancelled);

    // Second cancel is a no-op on the already-terminal task.
    assert!(!manager.cancel(id).await);
    let second = manager.get_task(id).await.unwrap();
    assert_eq!(second.status, TaskStatus::Cancelled);
    assert_eq!(second.ended_at, first.ended_at);
}

#[tokio::test]
async fn cancel_interrupts_a_paused_task() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "paused.bin", 32 * 1024 * 1024);

    let manager = small_chunk_manager();
    let id = manager
        .create_task(CopyRequest::single(&source, temp_dir.path().join("out.bin")))
        .await
        .unwrap();

    wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
        record.status == TaskStatus::Running && record.copied_bytes > 0
    })
    .await;
    assert!(manager.pause(id).await);
    wait_for_status(&manager, id, TaskStatus::Paused, TERMINAL_TIMEOUT).await;

    // A paused worker must still honor cancellation promptly.
    assert!(manager.cancel(id).await);
    let record = wait_for_terminal(&manager, id, Duration::from_secs(5)).await;
    assert_eq!(record.status, TaskStatus::Cancelled);
}

#[tokio::test]
async fn multi_source_task_copies_everything() {
    let temp_dir = TempDir::new().unwrap();
    let file_a = create_test_file(&temp_dir, "a.bin", 8 * 1024);
    let file_b = create_test_file(&temp_dir, "b.bin", 16 * 1024);
    let tree = temp_dir.path().join("tree");
    create_mixed_tree(&tree);
    let dest = temp_dir.path().join("dest");
    tokio::fs::create_dir(&dest).await.unwrap();

    let manager = TaskManager::new(ManagerConfig::default());
    let id = manager
        .create_task(CopyRequest::new(
            [file_a.clone(), file_b.clone(), tree.clone()],
            dest.clone(),
        ))
        .await
        .unwrap();

    let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
    assert_eq!(record.status, TaskStatus::Completed);
    // 2 direct files + 3 files inside the tree.
    assert_eq!(record.total_items, 5);
    assert_eq!(record.copied_items, 5);

    assert!(dest.join("a.bin").exists());
    assert!(dest.join("b.bin").exists());
    assert!(dest.join("tree/one.bin").exists());
    assert!(dest.join("tree/empty").is_dir());
}

#[tokio::test]
async fn event_stream_reports_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "events.bin", 256 * 1024);

    let manager = TaskManager::new(ManagerConfig::default());
    let mut events = manager.subscribe();

    let id = manager
        .create_task(CopyRequest::single(&source, temp_dir.path().join("out.bin")))
        .await
        .unwrap();
    wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.task_id() == id {
            kinds.push(event.kind());
        }
    }

    assert!(kinds.contains(&"started"), "events seen: {kinds:?}");
    assert!(kinds.contains(&"completed"), "events seen: {kinds:?}");
    // Progress ticks may be dropped under lag, but the record is the
    // source of truth regardless.
    let record = manager.get_task(id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
}

#[tokio::test]
async fn bulk_operations_fan_out() {
    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().join("dest");
    tokio::fs::create_dir(&dest).await.unwrap();

    let manager = small_chunk_manager();
    let mut ids = Vec::new();
    for i in 0..3 {
        let source = create_test_file(&temp_dir, &format!("bulk-{i}.bin"), 32 * 1024 * 1024);
        ids.push(
            manager
                .create_task(CopyRequest::single(&source, &dest))
                .await
                .unwrap(),
        );
    }

    for &id in &ids {
        wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
            record.status == TaskStatus::Running && record.copied_bytes > 0
        })
        .await;
    }

    assert_eq!(manager.pause_all().await, 3);
    for &id in &ids {
        assert_eq!(
            manager.get_task(id).await.unwrap().status,
            TaskStatus::Paused
        );
    }

    assert_eq!(manager.resume_all().await, 3);
    assert_eq!(manager.cancel_all().await, 3);
    for &id in &ids {
        let record = wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;
        assert_eq!(record.status, TaskStatus::Cancelled);
    }

    assert_eq!(manager.clear_completed().await, 3);
    assert!(manager.list_tasks().await.is_empty());
}

#[tokio::test]
async fn export_log_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "exported.bin", 4096);

    let manager = TaskManager::new(ManagerConfig {
        export_directory: Some(temp_dir.path().join("exports")),
        ..ManagerConfig::default()
    });
    let id = manager
        .create_task(CopyRequest::single(&source, temp_dir.path().join("out.bin")))
        .await
        .unwrap();
    wait_for_terminal(&manager, id, TERMINAL_TIMEOUT).await;

    let path = manager.export_log().await.unwrap();
    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let parsed: bulkcp_engine::TaskLogExport = serde_json::from_str(&contents).unwrap();

    assert_eq!(parsed.tasks.len(), 1);
    let task = &parsed.tasks[0];
    assert_eq!(task.id, id);
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.copied_bytes, 4096);
    assert!(task.started_at <= parsed.export_time);
}

#[tokio::test]
async fn removing_an_active_task_cancels_its_worker() {
    let temp_dir = TempDir::new().unwrap();
    let source = create_test_file(&temp_dir, "removed.bin", 64 * 1024 * 1024);
    let dest = temp_dir.path().join("removed-copy.bin");

    let manager = small_chunk_manager();
    let id = manager
        .create_task(CopyRequest::single(&source, &dest))
        .await
        .unwrap();

    wait_for(&manager, id, TERMINAL_TIMEOUT, |record| {
        record.copied_bytes > 0
    })
    .await;

    assert!(manager.remove(id).await);
    assert!(manager.get_task(id).await.is_none());

    // The worker notices the implicit cancel and stops writing: the
    // partial destination stops growing.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let size_after_remove = tokio::fs::metadata(&dest).await.map(|m| m.len()).unwrap_or(0);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let size_later = tokio::fs::metadata(&dest).await.map(|m| m.len()).unwrap_or(0);
    assert_eq!(size_after_remove, size_later);
    assert!(size_later < 64 * 1024 * 1024);
}
