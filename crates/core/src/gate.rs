//! Credential gate and namespace resolution.
//!
//! Every file operation starts here. The gate turns the two header-supplied strings into a
//! [`Namespace`] or refuses the request. Both kinds of failure (unknown access code, missing or
//! unusable collision string) produce the same [`Forbidden`] value so callers cannot leak which
//! check failed.

use crate::config::CoreConfig;
use stash_files::NamespaceStore;
use stash_types::PathSegment;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Credential check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid accessCode or collisionString")]
pub struct Forbidden;

/// A resolved, authorised storage namespace.
///
/// The directory is `storage_root/collision_string/access_code`. Distinct pairs always map to
/// distinct directories because both parts are single path segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    collision_string: PathSegment,
    access_code: PathSegment,
    dir: PathBuf,
}

impl Namespace {
    pub fn collision_string(&self) -> &PathSegment {
        &self.collision_string
    }

    pub fn access_code(&self) -> &PathSegment {
        &self.access_code
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File store scoped to this namespace.
    pub fn store(&self) -> NamespaceStore {
        NamespaceStore::new(self.dir.clone())
    }
}

/// Resolves header credentials against the startup access-code set.
#[derive(Clone, Debug)]
pub struct CredentialGate {
    cfg: Arc<CoreConfig>,
}

impl CredentialGate {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Resolve a namespace from the raw header values.
    ///
    /// `None` stands for an absent (or unreadable) header. The access code must equal one of
    /// the configured codes exactly. The collision string must be a non-empty single path
    /// segment. Pure: nothing is created on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Forbidden`] if either check fails.
    pub fn resolve(
        &self,
        access_code: Option<&str>,
        collision_string: Option<&str>,
    ) -> Result<Namespace, Forbidden> {
        let access_code = access_code
            .and_then(|code| self.cfg.access_codes().find(code))
            .ok_or(Forbidden)?
            .clone();
        let collision_string = collision_string
            .and_then(|s| PathSegment::new(s).ok())
            .ok_or(Forbidden)?;

        let dir = self
            .cfg
            .storage_root()
            .join(&collision_string)
            .join(&access_code);

        Ok(Namespace {
            collision_string,
            access_code,
            dir,
        })
    }
}
