//! HTTP server assembly.
//!
//! The server is a reverse proxy in front of the back-office API. Every
//! request falls through to the raw forwarder; a response-rewrite layer
//! wraps it and intercepts the routes the access rules cover.

pub mod middleware;
pub mod proxy;

use crate::backend::BackendClient;
use crate::error::AppError;
use crate::rewrite::{RewriteDispatcher, RouteTable};
use crate::session::SessionResolver;
use axum::Router;
use axum::middleware::from_fn_with_state;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to the middleware and the forwarder
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub dispatcher: Arc<RewriteDispatcher>,
    pub sessions: Arc<dyn SessionResolver>,
    pub backend: Arc<BackendClient>,
}

/// Build the proxy router: a catch-all forwarder wrapped by the
/// response-rewrite layer and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(proxy::forward)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rewrite_response,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the cancellation token fires
pub async fn run(
    state: AppState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "proxy listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("proxy stopped");
    Ok(())
}
