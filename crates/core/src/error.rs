use stash_types::SegmentError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read config file {path}: {source}", path = .path.display())]
    ConfigRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no access codes configured (set STASH_ACCESS_CODES or add an accessCodes= line to the config file)")]
    MissingAccessCodes,
    #[error("invalid access code {code:?}: {source}")]
    InvalidAccessCode {
        code: String,
        #[source]
        source: SegmentError,
    },
    #[error("failed to create storage root: {0}")]
    StorageRootCreation(std::io::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
