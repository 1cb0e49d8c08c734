//! Stash File Storage
//!
//! This crate provides the filesystem operations behind the Stash HTTP API. Each operation acts
//! on exactly one namespace directory and never reaches outside it.
//!
//! ## Storage Layout
//!
//! ```text
//! <storage_root>/
//! └── <collision_string>/
//!     └── <access_code>/       # namespace directory, created on first upload
//!         ├── notes.txt
//!         └── backup.json
//! ```
//!
//! Namespace directories are flat: uploads never create subdirectories, and listing skips any
//! directory it finds.
//!
//! ## Concurrency
//!
//! There is no locking. Two writers of the same name race and the last one wins; a concurrent
//! `delete_all` and upload may interleave either way.
//!
//! ## Example Usage
//!
//! ```no_run
//! use stash_files::NamespaceStore;
//! use stash_types::PathSegment;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = NamespaceStore::new("files/device-42/team-a");
//! store.ensure_dir().await?;
//! let mut upload = store.create(&PathSegment::new("note.txt")?).await?;
//! upload.write_chunk(b"hi").await?;
//! upload.finish().await?;
//! for entry in store.list()? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

mod store;
mod upload;

pub use stash_types::PathSegment;
pub use store::{FileEntry, NamespaceStore};
pub use upload::PendingUpload;

/// Errors that can occur during namespace file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Target file does not exist in the namespace
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Namespace directory does not exist
    #[error("namespace directory not found: {0}")]
    NamespaceNotFound(String),

    /// Rename target already exists
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    /// Namespace directory could not be created
    #[error("failed to create namespace directory: {0}")]
    DirCreation(std::io::Error),

    /// Namespace directory could not be recreated after a wipe
    #[error("failed to recreate namespace directory: {0}")]
    DirRecreation(std::io::Error),

    /// File could not be created or its bytes written
    #[error("failed to write file: {0}")]
    Write(std::io::Error),

    /// Namespace directory could not be read
    #[error("failed to read namespace directory: {0}")]
    ReadDir(std::io::Error),

    /// Rename failed
    #[error("failed to rename file: {0}")]
    Rename(std::io::Error),

    /// Single file removal failed
    #[error("failed to remove file: {0}")]
    Remove(std::io::Error),

    /// Recursive namespace removal failed
    #[error("failed to clear namespace directory: {0}")]
    Clear(std::io::Error),
}

pub type FilesResult<T> = std::result::Result<T, FilesError>;
