//! Buffered async file writer

use bulkcp_types::{Error, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Async file writer used by the chunked copy loop
#[derive(Debug)]
pub struct ChunkedWriter {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl ChunkedWriter {
    /// Create a new file for writing, truncating an existing one
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).await.map_err(|e| Error::Io {
            message: format!("Failed to create file '{}': {}", path.display(), e),
        })?;

        debug!("Created file for writing: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            bytes_written: 0,
        })
    }

    /// Write a full chunk of data
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).await.map_err(|e| Error::Io {
            message: format!("Failed to write to file: {}", e),
        })?;

        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Flush buffered data to the file
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await.map_err(|e| Error::Io {
            message: format!("Failed to flush writer: {}", e),
        })
    }

    /// Get the number of bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
