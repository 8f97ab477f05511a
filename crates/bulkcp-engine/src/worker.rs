//! The per-task copy worker
//!
//! Exactly one worker runs for a given task. It owns every mutation of
//! the task's progress fields; external control calls only flip the
//! cancellation token and pause flag.

use crate::notify::{Notifier, TaskEvent};
use crate::task::TaskHandle;
use bulkcp_io::{copy_file, copy_tree, measure_sources, CopyControls, CopyOptions, CopyProgress};
use bulkcp_types::{Error, Result, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Everything a worker needs to drive one task to a terminal state
pub(crate) struct WorkerContext {
    pub handle: Arc<TaskHandle>,
    pub notifier: Notifier,
    pub options: CopyOptions,
    pub pause_poll: Duration,
    pub semaphore: Option<Arc<Semaphore>>,
}

/// Spawn the worker for a task
pub(crate) fn spawn(ctx: WorkerContext) {
    tokio::spawn(run(ctx));
}

async fn run(ctx: WorkerContext) {
    let WorkerContext {
        handle,
        notifier,
        options,
        pause_poll,
        semaphore,
    } = ctx;
    let task_id = handle.id();

    // Fix the totals before the first byte is copied. The walk is
    // blocking, so it runs off the async threads.
    let items = handle.source_items().to_vec();
    let totals = match tokio::task::spawn_blocking(move || measure_sources(&items)).await {
        Ok(totals) => totals,
        Err(e) => {
            warn!("Totals scan for task {} did not finish: {}", task_id, e);
            Default::default()
        }
    };
    handle.set_totals(totals.total_bytes, totals.total_items);
    debug!(
        "Task {} measured: {} files, {} bytes",
        task_id, totals.total_items, totals.total_bytes
    );

    // Tasks beyond the concurrency cap wait here in `Preparing`. The
    // wait must stay responsive to cancellation.
    let _permit = match &semaphore {
        Some(sem) => {
            tokio::select! {
                _ = handle.cancel_token().cancelled() => {
                    finalize_cancelled(&handle, &notifier);
                    return;
                }
                permit = Arc::clone(sem).acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        warn!("Worker slots closed before task {} could start", task_id);
                        finalize_cancelled(&handle, &notifier);
                        return;
                    }
                }
            }
        }
        None => None,
    };

    if handle.cancel_token().is_cancelled() {
        finalize_cancelled(&handle, &notifier);
        return;
    }

    if !handle.try_transition(TaskStatus::Running) {
        debug!("Task {} is no longer startable", task_id);
        return;
    }

    info!(
        "Task {} started: {} item(s) -> {}",
        task_id,
        handle.source_items().len(),
        handle.destination().display()
    );
    notifier.publish(TaskEvent::Started {
        task_id,
        record: handle.snapshot(),
    });

    let controls = CopyControls::new(
        handle.cancel_token().clone(),
        handle.pause_flag(),
        pause_poll,
    );
    let start = Instant::now();

    let outcome = copy_items(&handle, &notifier, &options, &controls, start).await;

    match outcome {
        Ok(()) => {
            handle.set_current_item(None);
            let completed = finalize_terminal(&handle, &notifier, &controls, || {
                handle.try_transition(TaskStatus::Completed)
            })
            .await;
            if completed {
                info!(
                    "Task {} completed: {} bytes in {:?}",
                    task_id,
                    handle.copied_bytes(),
                    start.elapsed()
                );
                notifier.publish(TaskEvent::Completed { task_id });
            }
            notifier.publish(TaskEvent::StatusChanged {
                task_id,
                record: handle.snapshot(),
            });
        }
        Err(error) if error.is_cancelled() => {
            finalize_cancelled(&handle, &notifier);
        }
        Err(error) => {
            let failed = finalize_terminal(&handle, &notifier, &controls, || {
                handle.fail(error.to_string())
            })
            .await;
            if failed {
                warn!("Task {} failed: {}", task_id, error);
            }
            notifier.publish(TaskEvent::StatusChanged {
                task_id,
                record: handle.snapshot(),
            });
        }
    }
}

/// Drive a terminal transition to a legal landing.
///
/// A pause can arrive between the last chunk and the worker's terminal
/// transition, which must not happen out of `Paused`. When the attempt
/// is rejected and the task is not yet terminal, the worker waits at the
/// pause checkpoint and retries after resume. Cancellation during the
/// wait wins. Returns whether `transition` eventually succeeded.
async fn finalize_terminal(
    handle: &TaskHandle,
    notifier: &Notifier,
    controls: &CopyControls,
    mut transition: impl FnMut() -> bool,
) -> bool {
    loop {
        if transition() {
            return true;
        }
        if handle.is_terminal() {
            return false;
        }
        if controls.checkpoint().await.is_err() {
            finalize_cancelled(handle, notifier);
            return false;
        }
    }
}

/// Iterate the source items in order, dispatching each to the file or
/// tree copier. Chunk-level callbacks feed the progress counters with
/// deltas so bytes are never double-counted.
async fn copy_items(
    handle: &TaskHandle,
    notifier: &Notifier,
    options: &CopyOptions,
    controls: &CopyControls,
    start: Instant,
) -> Result<()> {
    let task_id = handle.id();
    let destination = handle.destination().clone();
    let mut last_file: Option<PathBuf> = None;
    let mut last_bytes = 0u64;

    for item in handle.source_items() {
        controls.checkpoint().await?;
        handle.set_current_item(Some(item.clone()));

        // Every item starts a fresh per-file cumulative sequence, even
        // when the same path appears twice in the source list.
        last_file = None;
        last_bytes = 0;

        let metadata = tokio::fs::metadata(item).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound { path: item.clone() },
            _ => Error::Io {
                message: format!("Failed to read metadata for '{}': {}", item.display(), e),
            },
        })?;

        let mut on_progress = |p: CopyProgress| {
            if last_file.as_ref() != Some(&p.file) {
                last_file = Some(p.file.clone());
                last_bytes = 0;
                handle.set_current_item(Some(p.file.clone()));
            }
            let delta = p.bytes_copied.saturating_sub(last_bytes);
            last_bytes = p.bytes_copied;
            let copied = handle.add_copied_bytes(delta);

            let elapsed = start.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                (copied as f64 / elapsed) as u64
            } else {
                0
            };
            let total = handle.total_bytes();
            let eta = if speed > 0 && total > copied {
                Some((total - copied) / speed)
            } else {
                None
            };
            handle.update_rates(speed, eta);

            notifier.publish(TaskEvent::Progress {
                task_id,
                progress: handle.progress(),
            });
        };

        if metadata.is_dir() {
            let stats = copy_tree(item, &destination, options, &mut on_progress, controls).await?;
            handle.add_copied_items(stats.files_copied);
        } else {
            copy_file(item, &destination, options, &mut on_progress, controls).await?;
            handle.add_copied_items(1);
        }
    }

    Ok(())
}

/// Converge on the `Cancelled` terminal state. The external `cancel`
/// call usually got there first; the transition attempt is then a no-op.
fn finalize_cancelled(handle: &TaskHandle, notifier: &Notifier) {
    handle.try_transition(TaskStatus::Cancelled);
    info!("Task {} cancelled", handle.id());
    notifier.publish(TaskEvent::StatusChanged {
        task_id: handle.id(),
        record: handle.snapshot(),
    });
}
