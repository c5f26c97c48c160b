//! Response-rewrite pipeline component.
//!
//! Planning happens before the request is forwarded so an unrestricted
//! user's traffic passes through byte-identical without buffering. Only
//! when a plan exists is the upstream body collected and rewritten.
//!
//! Failure policy: a session or lookup failure degrades to pass-through
//! rather than blocking the back office. Rewrite failures are absorbed
//! inside the dispatcher the same way.

use crate::error::AppError;
use crate::rewrite::QueryParams;
use crate::server::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

pub async fn rewrite_response(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(rule) = state.routes.resolve(req.uri().path()) else {
        return next.run(req).await;
    };

    let user = match state.sessions.resolve(req.headers()).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, path = req.uri().path(), "could not resolve session, passing through");
            return next.run(req).await;
        }
    };

    let query = QueryParams::parse(req.uri().query());
    let plan = match state.dispatcher.plan(rule, &user, &query).await {
        Ok(Some(plan)) => plan,
        Ok(None) => return next.run(req).await,
        Err(e) => {
            error!(error = %e, user = user.id, "start node lookup failed, passing through");
            return next.run(req).await;
        }
    };

    debug!(user = user.id, rule = ?rule, "response will be rewritten");
    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let original = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "could not buffer upstream response body");
            return AppError::from(std::io::Error::other(e)).into_response();
        }
    };

    let outcome = state.dispatcher.apply(&plan, &original).await;
    if outcome.forbidden {
        // the truncated item body still goes out so the client tree can
        // settle on it instead of refetching
        debug!(user = user.id, "item outside start nodes, responding forbidden");
        parts.status = StatusCode::FORBIDDEN;
    }

    // length changed with the body
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(outcome.body))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
    }
}
