//! Request and response bodies for the REST API.

use serde::{Deserialize, Serialize};
use stash_core::FileEntry;
use utoipa::{IntoParams, ToSchema};

/// Generic `{"message": ...}` body used for both successes and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of the file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntryRes {
    pub name: String,
    pub size: u64,
}

impl From<FileEntry> for FileEntryRes {
    fn from(entry: FileEntry) -> Self {
        Self {
            name: entry.name,
            size: entry.size,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameReq {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// Name of the file to download
    pub filename: Option<String>,
}

/// Multipart upload form, documented for OpenAPI only.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
