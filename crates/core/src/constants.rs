//! Constants used throughout the Stash core crate.

/// Default storage root when no explicit directory is configured.
pub const DEFAULT_STORAGE_DIR: &str = "files";

/// Default location of the line-based config file holding the access codes.
pub const DEFAULT_CONFIG_FILE: &str = "env.conf";

/// Key prefix of the access-code line in the config file.
pub const ACCESS_CODES_KEY: &str = "accessCodes=";

/// Separator between access codes in the config file and environment variable.
pub const ACCESS_CODES_SEPARATOR: char = ',';

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3456";
