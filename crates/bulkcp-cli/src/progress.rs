//! Progress display for the CLI

use bulkcp_types::{TaskProgress, TaskRecord, TaskStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Renders task progress as a terminal progress bar.
///
/// Updates are throttled so a fast event stream does not flood the
/// terminal.
pub struct ProgressRenderer {
    bar: Option<ProgressBar>,
    last_update: Instant,
    update_interval: Duration,
}

impl ProgressRenderer {
    /// Create a new renderer; quiet mode disables all output
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            None
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        };

        Self {
            bar,
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
        }
    }

    /// Initialize the bar from the starting record
    pub fn start(&mut self, record: &TaskRecord) {
        if let Some(bar) = &self.bar {
            bar.set_length(record.total_bytes);
            bar.set_message("copying");
        }
    }

    /// Apply a progress tick
    pub fn update(&mut self, progress: &TaskProgress) {
        if self.last_update.elapsed() < self.update_interval {
            return;
        }
        self.last_update = Instant::now();

        if let Some(bar) = &self.bar {
            bar.set_length(progress.total_bytes);
            bar.set_position(progress.copied_bytes);

            let file_name = progress
                .current_item
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("copying");
            bar.set_message(file_name.to_string());
        }
    }

    /// Show an intermediate status change (paused/resumed)
    pub fn status(&mut self, status: TaskStatus) {
        if let Some(bar) = &self.bar {
            bar.set_message(status.to_string().to_lowercase());
        }
    }

    /// Finish the display with the final record state
    pub fn finish(&mut self, record: &TaskRecord) {
        if let Some(bar) = &self.bar {
            bar.set_position(record.copied_bytes);
            match record.status {
                TaskStatus::Completed => bar.finish_with_message("done"),
                TaskStatus::Cancelled => bar.abandon_with_message("cancelled"),
                TaskStatus::Failed => bar.abandon_with_message("failed"),
                _ => bar.abandon(),
            }
        }
    }
}

/// Format a byte count for humans
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(human_bytes(10 * 1024 * 1024), "10.0 MiB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
