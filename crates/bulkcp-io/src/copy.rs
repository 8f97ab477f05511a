//! Chunked single-file copy with progress and cancellation

use crate::{ChunkedReader, ChunkedWriter, CopyControls};
use bulkcp_types::{ChunkSize, Error, Result};
use bytes::BytesMut;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for customizing copy behavior
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Chunk size for I/O operations
    pub chunk_size: usize,
    /// Preserve file timestamps and permissions
    pub preserve_metadata: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::DEFAULT,
            preserve_metadata: true,
        }
    }
}

impl CopyOptions {
    /// Set the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Enable or disable metadata preservation
    pub fn preserve_metadata(mut self, preserve: bool) -> Self {
        self.preserve_metadata = preserve;
        self
    }
}

/// Progress report emitted after every chunk write.
///
/// `bytes_copied` is cumulative for `file`, resetting to zero whenever a
/// new file starts.
#[derive(Debug, Clone)]
pub struct CopyProgress {
    /// The file currently being copied
    pub file: PathBuf,
    /// Cumulative bytes written for this file
    pub bytes_copied: u64,
}

/// Chunk-level progress callback
pub type ProgressFn<'a> = &'a mut (dyn FnMut(CopyProgress) + Send);

/// Copy a single file in fixed-size chunks.
///
/// The destination's parent directory is created when absent; when the
/// destination is an existing directory, the source base name is appended
/// to form the final path. The controls are checked after every chunk, so
/// cancellation latency is bounded by one chunk-copy duration.
/// Cancellation leaves a partial destination file in place.
///
/// Returns the number of bytes copied.
pub async fn copy_file(
    source: &Path,
    destination: &Path,
    options: &CopyOptions,
    on_progress: ProgressFn<'_>,
    controls: &CopyControls,
) -> Result<u64> {
    let metadata = source_file_metadata(source).await?;

    let final_dest = resolve_destination(source, destination).await?;

    debug!(
        "Starting copy: {} -> {} ({} bytes)",
        source.display(),
        final_dest.display(),
        metadata.len()
    );

    controls.checkpoint().await?;

    let mut reader = ChunkedReader::open(source).await?;
    let mut writer = ChunkedWriter::create(&final_dest).await?;
    let mut buf = BytesMut::with_capacity(options.chunk_size.max(1));

    // Announce the file before the first byte so zero-byte files and
    // current-item tracking still get a tick.
    on_progress(CopyProgress {
        file: source.to_path_buf(),
        bytes_copied: 0,
    });

    loop {
        let bytes_read = reader.read_chunk(&mut buf).await?;
        if bytes_read == 0 {
            break;
        }

        writer.write_chunk(&buf[..bytes_read]).await?;

        on_progress(CopyProgress {
            file: source.to_path_buf(),
            bytes_copied: writer.bytes_written(),
        });

        controls.checkpoint().await?;
    }

    writer.flush().await?;
    let bytes_copied = writer.bytes_written();

    if options.preserve_metadata {
        preserve_file_metadata(source, &final_dest).await;
    }

    debug!(
        "Copy completed: {} ({} bytes)",
        final_dest.display(),
        bytes_copied
    );
    Ok(bytes_copied)
}

/// Read the source metadata, mapping the failure modes to the copy error
/// taxonomy.
async fn source_file_metadata(source: &Path) -> Result<std::fs::Metadata> {
    let metadata = tokio::fs::metadata(source).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: source.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Error::PermissionDenied {
            path: source.to_path_buf(),
        },
        _ => Error::Io {
            message: format!("Failed to read metadata for '{}': {}", source.display(), e),
        },
    })?;

    if !metadata.is_file() {
        return Err(Error::other(format!(
            "Source '{}' is not a regular file",
            source.display()
        )));
    }

    Ok(metadata)
}

/// Resolve the final destination path, creating the parent directory.
pub(crate) async fn resolve_destination(source: &Path, destination: &Path) -> Result<PathBuf> {
    let final_dest = if tokio::fs::metadata(destination)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        match source.file_name() {
            Some(name) => destination.join(name),
            None => {
                return Err(Error::other(format!(
                    "Source '{}' has no file name",
                    source.display()
                )))
            }
        }
    } else {
        destination.to_path_buf()
    };

    if let Some(parent) = final_dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| Error::Io {
                message: format!(
                    "Failed to create destination directory '{}': {}",
                    parent.display(),
                    e
                ),
            })?;
        }
    }

    Ok(final_dest)
}

/// Best-effort copy of timestamps and permissions from source to
/// destination. Failures are logged, never propagated.
async fn preserve_file_metadata(source: &Path, destination: &Path) {
    let metadata = match tokio::fs::metadata(source).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(
                "Failed to read source metadata for '{}': {}",
                source.display(),
                e
            );
            return;
        }
    };

    let accessed = metadata
        .accessed()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let modified = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());

    if let Err(e) = filetime::set_file_times(
        destination,
        filetime::FileTime::from_system_time(accessed),
        filetime::FileTime::from_system_time(modified),
    ) {
        warn!(
            "Failed to set file times on '{}': {}",
            destination.display(),
            e
        );
    }

    #[cfg(unix)]
    {
        if let Err(e) = tokio::fs::set_permissions(destination, metadata.permissions()).await {
            warn!(
                "Failed to set permissions on '{}': {}",
                destination.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk_counter(counter: std::sync::Arc<std::sync::atomic::AtomicU64>) -> impl FnMut(CopyProgress) + Send {
        move |p| {
            counter.store(p.bytes_copied, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_copy_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.bin");
        let dest = temp_dir.path().join("dest.bin");

        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&source, &data).await.unwrap();

        let mut last = 0u64;
        let mut on_progress = |p: CopyProgress| last = p.bytes_copied;
        let bytes = copy_file(
            &source,
            &dest,
            &CopyOptions::default().with_chunk_size(4096),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        assert_eq!(bytes, data.len() as u64);
        assert_eq!(last, data.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_copy_into_existing_directory_appends_name() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.txt");
        let dest_dir = temp_dir.path().join("dest");
        tokio::fs::write(&source, b"contents").await.unwrap();
        tokio::fs::create_dir(&dest_dir).await.unwrap();

        let mut on_progress = |_: CopyProgress| {};
        copy_file(
            &source,
            &dest_dir,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        let copied = dest_dir.join("report.txt");
        assert_eq!(tokio::fs::read(&copied).await.unwrap(), b"contents");
    }

    #[tokio::test]
    async fn test_copy_creates_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        let dest = temp_dir.path().join("a/b/c/dest.txt");
        tokio::fs::write(&source, b"nested").await.unwrap();

        let mut on_progress = |_: CopyProgress| {};
        copy_file(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"nested");
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("missing.bin");
        let dest = temp_dir.path().join("dest.bin");

        let mut on_progress = |_: CopyProgress| {};
        let err = copy_file(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_copy_zero_byte_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("empty.bin");
        let dest = temp_dir.path().join("empty-copy.bin");
        tokio::fs::write(&source, b"").await.unwrap();

        let counter = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(u64::MAX));
        let mut on_progress = chunk_counter(std::sync::Arc::clone(&counter));
        let bytes = copy_file(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        assert_eq!(bytes, 0);
        // The announce tick fires even for empty files.
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_cancelled_copy_leaves_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("large.bin");
        let dest = temp_dir.path().join("partial.bin");
        tokio::fs::write(&source, vec![1u8; 512 * 1024]).await.unwrap();

        let controls = CopyControls::unrestricted();
        let cancel = controls.cancel_token().clone();

        // Cancel after the first chunk lands.
        let mut on_progress = move |p: CopyProgress| {
            if p.bytes_copied > 0 {
                cancel.cancel();
            }
        };

        let err = copy_file(
            &source,
            &dest,
            &CopyOptions::default().with_chunk_size(4096),
            &mut on_progress,
            &controls,
        )
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
        // No rollback of what was already written.
        let written = tokio::fs::metadata(&dest).await.unwrap().len();
        assert!(written < 512 * 1024);
    }
}
