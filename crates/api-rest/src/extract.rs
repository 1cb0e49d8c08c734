//! Request extractors.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use stash_core::Namespace;
use std::net::SocketAddr;

/// Header carrying the tenant access code.
pub const ACCESS_CODE_HEADER: &str = "accesscode";

/// Header carrying the client-chosen collision string.
pub const COLLISION_STRING_HEADER: &str = "collisionstring";

/// An authorised namespace, resolved from the credential headers.
///
/// Extracting a `Tenant` runs the credential gate. Handlers that take one as their first
/// argument reject with 403 before looking at anything else in the request.
#[derive(Debug, Clone)]
pub struct Tenant(pub Namespace);

#[axum::async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let access_code = header_str(&parts.headers, ACCESS_CODE_HEADER);
        let collision_string = header_str(&parts.headers, COLLISION_STRING_HEADER);
        let ip = client_ip(parts);
        let path = parts.uri.path();

        match state.gate.resolve(access_code, collision_string) {
            Ok(namespace) => {
                tracing::info!(
                    ip = %ip,
                    path,
                    collision_string = %namespace.collision_string(),
                    "request"
                );
                Ok(Tenant(namespace))
            }
            Err(forbidden) => {
                tracing::info!(ip = %ip, path, "rejected: {}", forbidden);
                Err(forbidden.into())
            }
        }
    }
}

/// Header value as UTF-8 text; absent or non-UTF-8 values count as missing.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
}

/// Best-effort client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
fn client_ip(parts: &Parts) -> String {
    if let Some(forwarded) = header_str(&parts.headers, "x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    if let Some(real_ip) = header_str(&parts.headers, "x-real-ip") {
        return real_ip.to_string();
    }
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
