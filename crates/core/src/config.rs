//! Core runtime configuration.
//!
//! This module defines configuration that is resolved once at process startup and then passed
//! into the credential gate. Core never reads process-wide environment variables itself; the
//! binary reads them and hands the raw values to the parsing helpers here. Changing the access
//! codes therefore requires a restart.

use crate::constants::{ACCESS_CODES_KEY, ACCESS_CODES_SEPARATOR};
use crate::{CoreError, CoreResult};
use stash_types::PathSegment;
use std::path::{Path, PathBuf};

/// The fixed set of accepted access codes.
///
/// Each code is also a directory name under a collision string, so every code is validated as a
/// [`PathSegment`] when the set is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessCodes(Vec<PathSegment>);

impl AccessCodes {
    /// Parse a comma-separated list of access codes.
    ///
    /// Entries are trimmed and empty entries are dropped, so `"A, B,"` yields `A` and `B`.
    /// An empty code would otherwise map tenants straight onto the collision-string directory.
    ///
    /// # Errors
    ///
    /// - `CoreError::MissingAccessCodes` if no non-empty entry remains
    /// - `CoreError::InvalidAccessCode` if an entry is not a valid path segment
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let codes = raw
            .split(ACCESS_CODES_SEPARATOR)
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| {
                PathSegment::new(code).map_err(|source| CoreError::InvalidAccessCode {
                    code: code.to_owned(),
                    source,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        if codes.is_empty() {
            return Err(CoreError::MissingAccessCodes);
        }
        Ok(Self(codes))
    }

    /// Returns the configured code equal to `candidate`, if any.
    pub fn find(&self, candidate: &str) -> Option<&PathSegment> {
        self.0.iter().find(|code| code.as_str() == candidate)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    storage_root: PathBuf,
    access_codes: AccessCodes,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(storage_root: PathBuf, access_codes: AccessCodes) -> CoreResult<Self> {
        if storage_root.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "storage root cannot be empty".into(),
            ));
        }

        Ok(Self {
            storage_root,
            access_codes,
        })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn access_codes(&self) -> &AccessCodes {
        &self.access_codes
    }

    /// Create the storage root if it does not exist yet.
    pub fn ensure_storage_root(&self) -> CoreResult<()> {
        if self.storage_root.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.storage_root).map_err(CoreError::StorageRootCreation)?;
        tracing::info!(root = %self.storage_root.display(), "created storage root");
        Ok(())
    }
}

/// Extract the raw access-code list from a line-based config file.
///
/// Lines starting with `accessCodes=` carry the list; when several are present the last one
/// wins. All other lines are ignored. A missing file is reported as `Ok(None)` so the caller
/// can fall back to other sources.
pub fn access_codes_from_config_file(path: &Path) -> CoreResult<Option<String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CoreError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(contents
        .lines()
        .filter_map(|line| line.strip_prefix(ACCESS_CODES_KEY))
        .last()
        .map(str::to_owned))
}

/// Resolve the access codes from an optional environment value and the config file.
///
/// A non-blank `env_value` takes precedence over the file.
pub fn resolve_access_codes(env_value: Option<String>, config_file: &Path) -> CoreResult<AccessCodes> {
    let env_value = env_value.filter(|v| !v.trim().is_empty());
    let raw = match env_value {
        Some(raw) => raw,
        None => access_codes_from_config_file(config_file)?.ok_or(CoreError::MissingAccessCodes)?,
    };

    AccessCodes::parse(&raw)
}
