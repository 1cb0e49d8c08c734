//! Request handlers.
//!
//! Each handler takes a [`Tenant`] first, so the credential gate always runs before the body,
//! query or path parameters are inspected. The HTTP method has already been checked by the
//! router by the time a handler runs.

use crate::error::ApiError;
use crate::extract::Tenant;
use crate::models::{FileEntryRes, ImportQuery, MessageRes, RenameReq, UploadForm};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{Path as AxumPath, Query, Request};
use axum::response::{IntoResponse, Json, Response};
use stash_core::{FilesError, PathSegment};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

const MSG_READ_FILE_FAILED: &str = "Failed to read file";
const MSG_MISSING_FILENAME: &str = "Missing filename";

#[utoipa::path(
    post,
    path = "/api/backup",
    params(
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = MessageRes),
        (status = 400, description = "Missing or invalid multipart payload", body = MessageRes),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes),
        (status = 500, description = "Directory or file could not be written", body = MessageRes)
    )
)]
/// Upload a file into the caller's namespace
///
/// Creates the namespace directory on first use, then streams the `file` part to disk chunk by
/// chunk, replacing any existing file of the same name. There is no size limit. A part that
/// fails mid-stream leaves no partial file behind.
///
/// # Errors
/// - `400` if the payload is not multipart, has no `file` part, the filename is unusable, or
///   the part cannot be read to the end
/// - `500` if the directory or file cannot be written
#[axum::debug_handler(state = AppState)]
pub(crate) async fn upload(
    Tenant(namespace): Tenant,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    let store = namespace.store();
    store.ensure_dir().await?;

    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Multipart rejection: {}", e);
        ApiError::bad_request(MSG_READ_FILE_FAILED)
    })?;
    let mut field = loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!("Multipart read error: {}", e);
            ApiError::bad_request(MSG_READ_FILE_FAILED)
        })?;
        match field {
            Some(field) if field.name() == Some(UPLOAD_FIELD) => break field,
            Some(_) => continue,
            None => return Err(ApiError::bad_request(MSG_READ_FILE_FAILED)),
        }
    };
    let name = field
        .file_name()
        .ok_or_else(|| ApiError::bad_request(MSG_READ_FILE_FAILED))
        .and_then(upload_file_name)?;

    let mut pending = store.create(&name).await?;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Multipart read error: {}", e);
                pending.abort().await;
                return Err(ApiError::bad_request(MSG_READ_FILE_FAILED));
            }
        };
        if let Err(e) = pending.write_chunk(&chunk).await {
            pending.abort().await;
            return Err(e.into());
        }
    }
    let size = pending.finish().await?;
    tracing::info!(file = %name, size, "file uploaded");

    Ok(Json(MessageRes::new("File uploaded successfully")))
}

/// Reduce a client-supplied upload filename to its final component.
///
/// Some browsers send a full local path (`C:\fakepath\notes.txt`); only the last component is
/// kept, and it must still be a valid path segment.
pub(crate) fn upload_file_name(raw: &str) -> Result<PathSegment, ApiError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    PathSegment::new(base).map_err(|_| ApiError::invalid_filename())
}

#[utoipa::path(
    get,
    path = "/api/import",
    params(
        ImportQuery,
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    responses(
        (status = 200, description = "Raw file bytes"),
        (status = 400, description = "Missing or invalid filename", body = MessageRes),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 404, description = "File does not exist", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes)
    )
)]
/// Download a file from the caller's namespace
///
/// The file is served by `ServeFile`, which sets the content type from the extension and
/// answers conditional and `Range` requests.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn download(
    Tenant(namespace): Tenant,
    query: Result<Query<ImportQuery>, QueryRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    let filename = query
        .ok()
        .and_then(|Query(q)| q.filename)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing filename parameter"))?;
    let name = PathSegment::new(&filename).map_err(|_| ApiError::invalid_filename())?;

    let path = namespace.store().locate(&name)?;
    tracing::info!(file = %name, "file download");

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}

#[utoipa::path(
    get,
    path = "/api/getlist",
    params(
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    responses(
        (status = 200, description = "Files, newest first", body = Vec<FileEntryRes>),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes),
        (status = 500, description = "Directory could not be read", body = MessageRes)
    )
)]
/// List the files in the caller's namespace, newest first
///
/// A namespace that has never received an upload lists as empty.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn list(Tenant(namespace): Tenant) -> Result<Json<Vec<FileEntryRes>>, ApiError> {
    let entries = namespace.store().list()?;
    Ok(Json(entries.into_iter().map(FileEntryRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/rename",
    params(
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    request_body = RenameReq,
    responses(
        (status = 200, description = "File renamed", body = MessageRes),
        (status = 400, description = "Invalid JSON or filename", body = MessageRes),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 404, description = "Old file does not exist", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes),
        (status = 409, description = "New name already taken", body = MessageRes),
        (status = 500, description = "Rename failed", body = MessageRes)
    )
)]
/// Rename a file within the caller's namespace
///
/// The body is parsed as JSON whatever its `Content-Type`.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn rename(
    Tenant(namespace): Tenant,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    let req: RenameReq = body
        .ok()
        .and_then(|body| serde_json::from_slice(&body).ok())
        .ok_or_else(|| ApiError::bad_request("Invalid JSON input"))?;

    let old_name = PathSegment::new(&req.old_name).map_err(|_| ApiError::invalid_filename())?;
    let new_name = PathSegment::new(&req.new_name).map_err(|_| ApiError::invalid_filename())?;

    namespace
        .store()
        .rename(&old_name, &new_name)
        .map_err(|e| match e {
            FilesError::FileNotFound(_) => ApiError::NotFound("Old file does not exist".into()),
            other => other.into(),
        })?;
    tracing::info!(from = %old_name, to = %new_name, "file renamed");

    Ok(Json(MessageRes::new("File renamed successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/delete/{filename}",
    params(
        ("filename" = String, Path, description = "File to delete"),
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    responses(
        (status = 200, description = "File deleted", body = MessageRes),
        (status = 400, description = "Missing or invalid filename", body = MessageRes),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 404, description = "File does not exist", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes),
        (status = 500, description = "Removal failed", body = MessageRes)
    )
)]
/// Delete one file from the caller's namespace. Irreversible.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn delete_one(
    Tenant(namespace): Tenant,
    filename: Result<AxumPath<String>, PathRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    let AxumPath(filename) = filename.map_err(|_| ApiError::bad_request(MSG_MISSING_FILENAME))?;
    let name = PathSegment::new(&filename).map_err(|_| ApiError::invalid_filename())?;

    namespace.store().delete(&name)?;
    tracing::info!(file = %name, "file deleted");

    Ok(Json(MessageRes::new(
        "File deleted from the cloud; this cannot be undone",
    )))
}

/// `DELETE /api/delete/` with nothing after the slash.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn delete_without_name(Tenant(_namespace): Tenant) -> ApiError {
    ApiError::bad_request(MSG_MISSING_FILENAME)
}

#[utoipa::path(
    delete,
    path = "/api/deleteALL",
    params(
        ("accessCode" = String, Header, description = "Tenant access code"),
        ("collisionString" = String, Header, description = "Namespace collision string")
    ),
    responses(
        (status = 200, description = "Namespace emptied", body = MessageRes),
        (status = 403, description = "Invalid credentials", body = MessageRes),
        (status = 404, description = "Namespace directory does not exist", body = MessageRes),
        (status = 405, description = "Wrong method", body = MessageRes),
        (status = 500, description = "Wipe or recreate failed", body = MessageRes)
    )
)]
/// Remove every file in the caller's namespace
///
/// The directory is removed and recreated empty. Not atomic: a failure after removal leaves
/// the namespace absent until the next upload.
#[axum::debug_handler(state = AppState)]
pub(crate) async fn delete_all(Tenant(namespace): Tenant) -> Result<Json<MessageRes>, ApiError> {
    namespace.store().delete_all()?;
    tracing::info!("namespace cleared");

    Ok(Json(MessageRes::new("All files cleared successfully")))
}

pub(crate) async fn only_get() -> ApiError {
    ApiError::MethodNotAllowed("GET")
}

pub(crate) async fn only_post() -> ApiError {
    ApiError::MethodNotAllowed("POST")
}

pub(crate) async fn only_delete() -> ApiError {
    ApiError::MethodNotAllowed("DELETE")
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}
