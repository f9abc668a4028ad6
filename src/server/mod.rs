//! server
//!
//! HTTP surface: two lookup routes in front of a downstream handler.
//!
//! # Routes
//!
//! - `POST /api/repos-info` - batch lookup, body `{"repos": [...]}`
//! - `GET  /api/repo-info?repo=<reference>` - single lookup
//! - anything else - handed unchanged to the downstream service
//!
//! Successful lookups answer 200 with `Cache-Control: public, max-age=<n>`.
//! Request-shape errors answer 4xx/5xx with `{"error": "..."}` and no
//! caching headers (see [`ApiError`]).
//!
//! # State
//!
//! [`AppState`] holds the immutable [`Settings`] and the upstream host. It is
//! built once at startup and shared by every request; nothing in it is
//! mutated afterwards.

pub mod downstream;
mod error;
mod handlers;

pub use error::ApiError;

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Body;
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower::Service;

use crate::core::config::Settings;
use crate::forge::github::GitHubHost;
use crate::forge::RepoHost;

/// Batch lookup route.
pub const BULK_ROUTE: &str = "/api/repos-info";

/// Single lookup route.
pub const SINGLE_ROUTE: &str = "/api/repo-info";

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Upstream repository host
    pub host: Arc<dyn RepoHost>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, host: Arc<dyn RepoHost>) -> Self {
        Self { settings, host }
    }
}

/// Build the router with the built-in 404 downstream.
pub fn router(state: AppState) -> Router {
    router_with_downstream(state, downstream::not_found())
}

/// Build the router, sending unmatched requests to `downstream`.
pub fn router_with_downstream<S>(state: AppState, downstream: S) -> Router
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    Router::new()
        .route(
            BULK_ROUTE,
            post(handlers::bulk).fallback(handlers::bulk_method_not_allowed),
        )
        .route(
            SINGLE_ROUTE,
            get(handlers::single).fallback(handlers::single_method_not_allowed),
        )
        .fallback_service(downstream)
        .with_state(state)
}

/// Run the HTTP server until SIGINT/SIGTERM.
///
/// Builds the GitHub host and the downstream from `settings`, binds the
/// listener, and serves with graceful shutdown.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let settings = Arc::new(settings);

    let host = GitHubHost::from_settings(&settings).context("failed to build upstream client")?;
    let state = AppState::new(Arc::clone(&settings), Arc::new(host));

    let app = match &settings.downstream_url {
        Some(url) => {
            let client = downstream::forwarding_client(&settings.user_agent)
                .context("failed to build downstream client")?;
            tracing::info!(downstream = %url, "forwarding unmatched requests");
            router_with_downstream(state, downstream::forward_to(url, client)?)
        }
        None => router(state),
    };

    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", settings.listen))?;

    tracing::info!(
        listen = %settings.listen,
        api_base = %settings.api_base,
        authenticated = settings.credential.is_some(),
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

/// Resolve when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
