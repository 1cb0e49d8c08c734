//! Path normalisation applied before routing.

use axum::extract::Request;
use axum::http::uri::{PathAndQuery, Uri};

/// Collapse runs of `/` in the request path into a single `/`.
///
/// The query string is left untouched. A URI that cannot be rebuilt is passed through as-is.
pub(crate) fn collapse_slashes(mut req: Request) -> Request {
    let path = req.uri().path();
    if !path.contains("//") {
        return req;
    }

    let collapsed = collapse(path);
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{collapsed}?{query}"),
        None => collapsed,
    };

    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = match PathAndQuery::try_from(path_and_query) {
        Ok(pq) => Some(pq),
        Err(e) => {
            tracing::warn!("Could not normalise request path: {}", e);
            return req;
        }
    };
    match Uri::from_parts(parts) {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => tracing::warn!("Could not rebuild request URI: {}", e),
    }
    req
}

fn collapse(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}
