//! Catch-all raw forwarder.
//!
//! Requests the rewrite layer does not claim are proxied to the upstream
//! unchanged. Response bodies stream straight through without buffering.

use crate::server::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Headers that describe the connection rather than the payload
const HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

pub async fn forward(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let headers = req.headers().clone();

    let body = match axum::body::to_bytes(req.into_body(), usize::MAX).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            error!(error = %e, "could not read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let upstream = match state
        .backend
        .forward_raw(method, &path_and_query, headers, body)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, path = path_and_query, "upstream unreachable");
            return (StatusCode::BAD_GATEWAY, "upstream unreachable").into_response();
        }
    };

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in &upstream_headers {
            if !HOP_HEADERS.contains(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    match builder.body(Body::from_stream(upstream.bytes_stream())) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "could not assemble proxied response");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
