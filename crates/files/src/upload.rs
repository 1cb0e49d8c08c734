//! Streaming upload writer
//!
//! Uploads arrive as a sequence of chunks and are written straight to the target file, so no
//! request ever holds a whole file in memory.

use crate::{FilesError, FilesResult};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A file being written chunk by chunk
///
/// Created by [`NamespaceStore::create`](crate::NamespaceStore::create). The target file is
/// truncated on creation, so an existing file of the same name is replaced. Finish with
/// [`PendingUpload::finish`], or call [`PendingUpload::abort`] to remove the partial file.
#[derive(Debug)]
pub struct PendingUpload {
    path: PathBuf,
    file: File,
    written: u64,
}

impl PendingUpload {
    pub(crate) async fn create(path: PathBuf) -> FilesResult<Self> {
        let file = File::create(&path).await.map_err(FilesError::Write)?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Appends one chunk to the file.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> FilesResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.file.write_all(chunk).await.map_err(FilesError::Write)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flushes the file and returns the total number of bytes written.
    pub async fn finish(mut self) -> FilesResult<u64> {
        self.file.flush().await.map_err(FilesError::Write)?;
        tracing::debug!(path = %self.path.display(), size = self.written, "file written");
        Ok(self.written)
    }

    /// Discards the upload and removes the partial file.
    pub async fn abort(self) {
        let Self { path, file, written } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial upload");
        } else {
            tracing::debug!(path = %path.display(), written, "partial upload removed");
        }
    }
}
