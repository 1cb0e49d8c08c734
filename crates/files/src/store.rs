//! Namespace-scoped file store
//!
//! [`NamespaceStore`] wraps a single namespace directory. It does not know how the directory
//! was chosen; credential checks and path resolution happen in `stash-core` before a store is
//! handed out. Every name it accepts is a [`PathSegment`], so joined paths are always direct
//! children of the namespace directory.

use crate::{FilesError, FilesResult, PendingUpload};
use chrono::{DateTime, Utc};
use stash_types::PathSegment;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A regular file in a namespace directory
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileEntry {
    /// Filename as supplied by the uploading client
    pub name: String,

    /// Size of the file in bytes
    pub size: u64,

    /// Last modification time, used for newest-first ordering
    #[serde(skip)]
    pub modified: DateTime<Utc>,
}

/// Flat file storage rooted at one namespace directory
///
/// Construction performs no I/O. The directory is created by [`NamespaceStore::ensure_dir`]
/// before an upload and may legitimately be absent, in which case [`NamespaceStore::list`] reports an
/// empty namespace.
#[derive(Debug, Clone)]
pub struct NamespaceStore {
    dir: PathBuf,
}

impl NamespaceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the namespace directory this store operates on.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the namespace directory (and its parents) if missing.
    ///
    /// Idempotent: an existing directory is not an error.
    pub async fn ensure_dir(&self) -> FilesResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(FilesError::DirCreation)
    }

    /// Opens `name` for a streaming write, replacing any existing file of that name.
    ///
    /// The namespace directory must already exist; call [`NamespaceStore::ensure_dir`] first.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Write` if the file cannot be created.
    pub async fn create(&self, name: &PathSegment) -> FilesResult<PendingUpload> {
        PendingUpload::create(self.dir.join(name)).await
    }

    /// Lists regular files, newest first.
    ///
    /// Entries with equal modification times are ordered by name so the result is stable.
    /// A missing namespace directory yields an empty list. Entries whose metadata cannot be
    /// read are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::ReadDir` if the directory exists but cannot be read.
    pub fn list(&self) -> FilesResult<Vec<FileEntry>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FilesError::ReadDir(e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(FilesError::ReadDir)?;
            let name = entry.file_name().to_string_lossy().into_owned();

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "skipping entry with unreadable metadata");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "skipping entry without modification time");
                    continue;
                }
            };

            entries.push(FileEntry {
                name,
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Resolves `name` to the path of an existing regular file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::FileNotFound` if no regular file of that name exists.
    pub fn locate(&self, name: &PathSegment) -> FilesResult<PathBuf> {
        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(FilesError::FileNotFound(name.to_string()))
        }
    }

    /// Renames `old` to `new` within the namespace directory.
    ///
    /// # Errors
    ///
    /// - `FilesError::FileNotFound` if `old` does not exist
    /// - `FilesError::AlreadyExists` if anything named `new` exists
    /// - `FilesError::Rename` if the filesystem rename fails
    pub fn rename(&self, old: &PathSegment, new: &PathSegment) -> FilesResult<()> {
        let old_path = self.locate(old)?;
        let new_path = self.dir.join(new);

        if fs::symlink_metadata(&new_path).is_ok() {
            return Err(FilesError::AlreadyExists(new.to_string()));
        }

        fs::rename(&old_path, &new_path).map_err(FilesError::Rename)
    }

    /// Removes a single file. Irreversible.
    ///
    /// # Errors
    ///
    /// - `FilesError::FileNotFound` if `name` does not exist
    /// - `FilesError::Remove` if removal fails
    pub fn delete(&self, name: &PathSegment) -> FilesResult<()> {
        let path = self.locate(name)?;
        fs::remove_file(&path).map_err(FilesError::Remove)
    }

    /// Removes every file in the namespace and leaves an empty directory behind.
    ///
    /// Not atomic: if recreation fails the directory stays absent until the next upload.
    ///
    /// # Errors
    ///
    /// - `FilesError::NamespaceNotFound` if the directory does not exist
    /// - `FilesError::Clear` if recursive removal fails
    /// - `FilesError::DirRecreation` if the empty directory cannot be recreated
    pub fn delete_all(&self) -> FilesResult<()> {
        if !self.dir.is_dir() {
            return Err(FilesError::NamespaceNotFound(
                self.dir.display().to_string(),
            ));
        }

        fs::remove_dir_all(&self.dir).map_err(FilesError::Clear)?;
        fs::create_dir_all(&self.dir).map_err(FilesError::DirRecreation)
    }
}
