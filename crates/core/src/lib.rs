//! # Stash Core
//!
//! Access control and namespace isolation for the Stash file store.
//!
//! This crate contains:
//! - startup configuration (`CoreConfig`, `AccessCodes`) and its parsing helpers
//! - the [`CredentialGate`], which maps `accessCode` / `collisionString` to a [`Namespace`]
//!
//! **No API concerns**: HTTP routing, status codes and JSON bodies belong in `api-rest`.
//! Filesystem operations inside a namespace live in `stash_files`.

pub mod config;
pub mod constants;
pub mod error;
pub mod gate;

pub use config::{AccessCodes, CoreConfig};
pub use constants::*;
pub use error::{CoreError, CoreResult};
pub use gate::{CredentialGate, Forbidden, Namespace};
pub use stash_files::{FileEntry, FilesError, NamespaceStore};
pub use stash_types::{PathSegment, SegmentError};
