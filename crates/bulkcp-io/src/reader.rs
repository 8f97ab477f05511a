//! Buffered async file reader producing bounded chunks

use bulkcp_types::{Error, Result};
use bytes::BytesMut;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::debug;

/// Async file reader that hands out data one bounded chunk at a time
#[derive(Debug)]
pub struct ChunkedReader {
    reader: BufReader<File>,
    file_size: u64,
    bytes_read: u64,
}

impl ChunkedReader {
    /// Open a file for reading
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| Error::Io {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let metadata = file.metadata().await.map_err(|e| Error::Io {
            message: format!("Failed to read file metadata: {}", e),
        })?;

        let file_size = metadata.len();
        let reader = BufReader::new(file);

        debug!(
            "Opened file for reading: {} ({} bytes)",
            path.display(),
            file_size
        );

        Ok(Self {
            reader,
            file_size,
            bytes_read: 0,
        })
    }

    /// Read the next chunk into `buf`, clearing any previous contents.
    ///
    /// Returns the number of bytes read; 0 means end of file. Reads at
    /// most the buffer's capacity, so memory use stays bounded for
    /// arbitrarily large files.
    pub async fn read_chunk(&mut self, buf: &mut BytesMut) -> Result<usize> {
        buf.clear();

        let bytes_read = self.reader.read_buf(buf).await.map_err(|e| Error::Io {
            message: format!("Failed to read from file: {}", e),
        })?;

        self.bytes_read += bytes_read as u64;
        Ok(bytes_read)
    }

    /// Get the total file size
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Get the number of bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
