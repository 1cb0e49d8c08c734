//! # API REST
//!
//! REST API implementation for Stash.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - credential extraction from the `accessCode` / `collisionString` headers
//! - REST-specific concerns (JSON error bodies, CORS, path normalisation, OpenAPI document)
//!
//! Uses `stash-core` for the credential gate and namespace file operations.

#![warn(rust_2018_idioms)]

mod error;
mod extract;
mod handlers;
mod models;
mod normalize;

pub use error::ApiError;
pub use extract::{Tenant, ACCESS_CODE_HEADER, COLLISION_STRING_HEADER};
pub use models::{FileEntryRes, MessageRes, RenameReq};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use stash_core::{CoreConfig, CredentialGate};
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;
use tower::util::MapRequestLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Browsers may cache a preflight answer for one day.
const CORS_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Application state shared across REST API handlers
///
/// Holds the credential gate, which in turn owns the immutable startup configuration.
#[derive(Clone)]
pub struct AppState {
    gate: CredentialGate,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            gate: CredentialGate::new(cfg),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::upload,
        handlers::download,
        handlers::list,
        handlers::rename,
        handlers::delete_one,
        handlers::delete_all,
    ),
    components(schemas(
        models::MessageRes,
        models::FileEntryRes,
        models::RenameReq,
        models::UploadForm,
    ))
)]
pub struct ApiDoc;

/// Build the complete HTTP application.
///
/// Routing happens on the normalised path: runs of `/` are collapsed first, so
/// `//api//getlist` reaches the list handler. Every response, including 404 and 405, carries
/// the CORS headers, and any `OPTIONS` request is answered 200 by the CORS layer.
pub fn router(cfg: Arc<CoreConfig>) -> Router {
    let state = AppState::new(cfg);

    let api = Router::new()
        .route(
            "/api/backup",
            post(handlers::upload)
                .fallback(handlers::only_post)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/api/import",
            get(handlers::download).fallback(handlers::only_get),
        )
        .route(
            "/api/getlist",
            get(handlers::list).fallback(handlers::only_get),
        )
        .route(
            "/api/rename",
            post(handlers::rename).fallback(handlers::only_post),
        )
        .route(
            "/api/delete/",
            delete(handlers::delete_without_name).fallback(handlers::only_delete),
        )
        .route(
            "/api/delete/:filename",
            delete(handlers::delete_one).fallback(handlers::only_delete),
        )
        .route(
            "/api/deleteALL",
            delete(handlers::delete_all).fallback(handlers::only_delete),
        )
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(handlers::not_found)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new().fallback_service(MapRequestLayer::new(normalize::collapse_slashes).layer(api))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(ACCESS_CODE_HEADER),
            HeaderName::from_static(COLLISION_STRING_HEADER),
        ])
        .max_age(CORS_MAX_AGE)
}

/// Serve the OpenAPI document describing the endpoints above.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
    use http_body_util::BodyExt;
    use stash_core::AccessCodes;
    use std::path::{Path, PathBuf};
    use std::time::SystemTime;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "stash-test-boundary";

    fn storage_root(temp: &TempDir) -> PathBuf {
        temp.path().join("files")
    }

    fn test_app(temp: &TempDir) -> Router {
        let cfg = CoreConfig::new(storage_root(temp), AccessCodes::parse("A,B").unwrap()).unwrap();
        router(Arc::new(cfg))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    fn message(body: &Bytes) -> String {
        serde_json::from_slice::<MessageRes>(body).unwrap().message
    }

    fn request(method: &str, uri: &str, cs: &str, code: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("accessCode", code)
            .header("collisionString", cs)
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_req(cs: &str, code: &str, filename: &str, content: &[u8]) -> Request<Body> {
        request("POST", "/api/backup", cs, code)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body("file", filename, content)))
            .unwrap()
    }

    fn get_req(uri: &str, cs: &str, code: &str) -> Request<Body> {
        request("GET", uri, cs, code).body(Body::empty()).unwrap()
    }

    fn delete_req(uri: &str, cs: &str, code: &str) -> Request<Body> {
        request("DELETE", uri, cs, code).body(Body::empty()).unwrap()
    }

    fn rename_req(cs: &str, code: &str, body: &str) -> Request<Body> {
        request("POST", "/api/rename", cs, code)
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn list_names(app: &Router, cs: &str, code: &str) -> Vec<FileEntryRes> {
        let (status, _, body) = send(app, get_req("/api/getlist", cs, code)).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    fn set_mtime(path: &Path, secs_after_epoch: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    #[tokio::test]
    async fn upload_then_list_scenario() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, upload_req("x", "A", "note.txt", b"hi")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message(&body), "File uploaded successfully");

        let (status, _, body) = send(&app, get_req("/api/getlist", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!([{"name": "note.txt", "size": 2}]));
        assert!(storage_root(&temp).join("x").join("A").join("note.txt").is_file());
    }

    #[tokio::test]
    async fn bad_credentials_are_forbidden() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let cases = [("x", "C"), ("x", ""), ("", "A"), ("..", "A"), ("a/b", "A")];
        for (cs, code) in cases {
            let (status, _, body) = send(&app, get_req("/api/getlist", cs, code)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{cs:?} {code:?}");
            assert_eq!(message(&body), "Invalid accessCode or collisionString");
        }

        let no_headers = Request::builder()
            .uri("/api/getlist")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, no_headers).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn credentials_checked_before_body() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let req = request("POST", "/api/backup", "x", "nope")
            .body(Body::from("not multipart"))
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!storage_root(&temp).join("x").exists());
    }

    #[tokio::test]
    async fn method_checked_before_credentials() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, get_req("/api/backup", "x", "nope")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(message(&body), "Only POST method is allowed");

        let (status, _, body) = send(&app, delete_req("/api/getlist", "x", "A")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(message(&body), "Only GET method is allowed");

        let (status, _, _) = send(&app, get_req("/api/deleteALL", "x", "A")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        send(&app, upload_req("x", "A", "secret.txt", b"for A only")).await;

        assert!(list_names(&app, "x", "B").await.is_empty());
        assert!(list_names(&app, "y", "A").await.is_empty());
        assert_eq!(list_names(&app, "x", "A").await.len(), 1);

        let (status, _, _) =
            send(&app, get_req("/api/import?filename=secret.txt", "x", "B")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_then_download_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        send(&app, upload_req("x", "A", "blob.bin", &content)).await;

        let (status, _, body) =
            send(&app, get_req("/api/import?filename=blob.bin", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), content.as_slice());
    }

    #[tokio::test]
    async fn upload_strips_client_directories() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, _) =
            send(&app, upload_req("x", "A", "scans/2024/report.pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<_> = list_names(&app, "x", "A")
            .await
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["report.pdf"]);
    }

    #[tokio::test]
    async fn upload_larger_than_default_body_limit() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        let content: Vec<u8> = (0..=250u8).cycle().take(5 * 1024 * 1024).collect();

        let (status, _, body) = send(&app, upload_req("x", "A", "big.bin", &content)).await;
        assert_eq!(status, StatusCode::OK, "{}", message(&body));

        let entries = list_names(&app, "x", "A").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, content.len() as u64);

        let (status, _, body) =
            send(&app, get_req("/api/import?filename=big.bin", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.len(), content.len());
        assert!(body.as_ref() == content.as_slice());
    }

    #[tokio::test]
    async fn truncated_upload_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let mut body = multipart_body("file", "cut.bin", &[7u8; 64 * 1024]);
        body.truncate(body.len() - 200);
        let req = request("POST", "/api/backup", "x", "A")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Failed to read file");
        assert!(list_names(&app, "x", "A").await.is_empty());
    }

    #[tokio::test]
    async fn non_ascii_collision_string() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        let cs = HeaderValue::from_bytes("设备1".as_bytes()).unwrap();

        let mut req = upload_req("placeholder", "A", "note.txt", b"hi");
        req.headers_mut().insert(COLLISION_STRING_HEADER, cs.clone());
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK, "{}", message(&body));

        let mut req = get_req("/api/getlist", "placeholder", "A");
        req.headers_mut().insert(COLLISION_STRING_HEADER, cs);
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!([{"name": "note.txt", "size": 2}]));

        assert!(storage_root(&temp).join("设备1").join("A").join("note.txt").is_file());
        assert!(!storage_root(&temp).join("placeholder").exists());
    }

    #[tokio::test]
    async fn upload_without_file_part_is_bad_request() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let req = request("POST", "/api/backup", "x", "A")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body("other", "a.txt", b"data")))
            .unwrap();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Failed to read file");

        let req = request("POST", "/api/backup", "x", "A")
            .body(Body::from("plain text"))
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_requires_filename() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, get_req("/api/import", "x", "A")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Missing filename parameter");

        let (status, _, _) = send(&app, get_req("/api/import?filename=..", "x", "A")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) =
            send(&app, get_req("/api/import?filename=ghost.txt", "x", "A")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "File does not exist");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        let dir = storage_root(&temp).join("x").join("A");

        for (i, name) in ["f1", "f2", "f3"].iter().enumerate() {
            send(&app, upload_req("x", "A", name, name.as_bytes())).await;
            set_mtime(&dir.join(name), 1_700_000_000 + i as u64 * 10);
        }

        let names: Vec<_> = list_names(&app, "x", "A")
            .await
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["f3", "f2", "f1"]);
    }

    #[tokio::test]
    async fn list_of_unused_namespace_is_empty() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, get_req("/api/getlist", "fresh", "B")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"[]");
    }

    #[tokio::test]
    async fn rename_flow() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        send(&app, upload_req("x", "A", "a.txt", b"aaa")).await;
        send(&app, upload_req("x", "A", "b.txt", b"bb")).await;

        let (status, _, body) =
            send(&app, rename_req("x", "A", r#"{"oldName":"a.txt","newName":"b.txt"}"#)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(message(&body), "New file name already exists");
        let (_, _, body) = send(&app, get_req("/api/import?filename=a.txt", "x", "A")).await;
        assert_eq!(body.as_ref(), b"aaa");

        let (status, _, body) =
            send(&app, rename_req("x", "A", r#"{"oldName":"zz.txt","newName":"c.txt"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Old file does not exist");

        let (status, _, _) = send(&app, rename_req("x", "A", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            rename_req("x", "A", r#"{"oldName":"a.txt","newName":"../escape.txt"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) =
            send(&app, rename_req("x", "A", r#"{"oldName":"a.txt","newName":"c.txt"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message(&body), "File renamed successfully");

        let mut names: Vec<_> = list_names(&app, "x", "A")
            .await
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn delete_flow() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        send(&app, upload_req("x", "A", "note.txt", b"hi")).await;

        let (status, _, _) = send(&app, delete_req("/api/delete/ghost.txt", "x", "A")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&app, delete_req("/api/delete/", "x", "A")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Missing filename");

        let (status, _, _) = send(&app, delete_req("/api/delete/..%2Fx", "x", "A")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(&app, delete_req("/api/delete/note.txt", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list_names(&app, "x", "A").await.is_empty());
    }

    #[tokio::test]
    async fn delete_all_flow() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, delete_req("/api/deleteALL", "x", "A")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Directory does not exist");

        for name in ["1.txt", "2.txt", "3.txt"] {
            send(&app, upload_req("x", "A", name, b"data")).await;
        }
        send(&app, upload_req("x", "B", "other.txt", b"keep")).await;

        let (status, _, _) = send(&app, delete_req("/api/deleteALL", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list_names(&app, "x", "A").await.is_empty());
        assert!(storage_root(&temp).join("x").join("A").is_dir());
        assert_eq!(list_names(&app, "x", "B").await.len(), 1);

        let (status, _, _) = send(&app, upload_req("x", "A", "again.txt", b"ok")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list_names(&app, "x", "A").await.len(), 1);
    }

    #[tokio::test]
    async fn repeated_slashes_are_collapsed() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        send(&app, upload_req("x", "A", "note.txt", b"hi")).await;

        let (status, _, _) = send(&app, get_req("//api///getlist", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) =
            send(&app, get_req("/api//import?filename=note.txt", "x", "A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"hi");
    }

    #[tokio::test]
    async fn options_anywhere_is_preflight() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        for uri in ["/api/backup", "/api/delete/x.txt", "/anything/else"] {
            let req = Request::builder()
                .method("OPTIONS")
                .uri(uri)
                .header(header::ORIGIN, "https://app.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap();
            let (status, headers, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(body.is_empty());
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
            let allowed_headers = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .to_ascii_lowercase();
            assert!(allowed_headers.contains("accesscode"));
            assert!(allowed_headers.contains("collisionstring"));
        }
    }

    #[tokio::test]
    async fn cors_origin_on_regular_and_error_responses() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (_, headers, _) = send(&app, get_req("/api/getlist", "x", "A")).await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let (status, headers, body) = send(&app, get_req("/api/getlist", "x", "bad")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/json"
        );
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_json_not_found() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let (status, _, body) = send(&app, get_req("/api/nothing", "x", "A")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Not found");
    }

    #[tokio::test]
    async fn openapi_document_lists_endpoints() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let req = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        for path in ["/api/backup", "/api/import", "/api/getlist", "/api/deleteALL"] {
            assert!(doc["paths"].get(path).is_some(), "{path}");
        }
    }
}
