//! server::downstream
//!
//! Handlers for requests that do not match a lookup route.
//!
//! The router hands every unmatched request, untouched, to a downstream
//! service. Two are provided:
//! - [`not_found`]: answers 404 (no downstream configured)
//! - [`forward_to`]: reverse-proxies to a configured origin, keeping method,
//!   path, query, headers (minus hop-by-hop ones), and body
//!
//! Any other `tower::Service` can be plugged in via
//! [`super::router_with_downstream`].

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use reqwest::{redirect, Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

/// Largest request body forwarded downstream.
const MAX_FORWARD_BODY: usize = 16 * 1024 * 1024;

/// Errors while forwarding a request downstream.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("invalid downstream url '{url}': {message}")]
    InvalidOrigin { url: String, message: String },

    #[error("request body too large or unreadable: {0}")]
    Body(String),

    #[error("downstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl DownstreamError {
    /// Status returned to the caller when forwarding fails.
    pub fn status(&self) -> StatusCode {
        match self {
            DownstreamError::InvalidOrigin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DownstreamError::Body(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DownstreamError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// HTTP client for [`forward_to`].
///
/// Redirects are never followed: a downstream 3xx goes back to the caller
/// as-is, `Location` included.
pub fn forwarding_client(user_agent: &str) -> Result<Client, DownstreamError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .redirect(redirect::Policy::none())
        .build()?)
}

/// Downstream that answers every request with 404.
pub fn not_found() -> Router {
    Router::new().fallback(|| async { StatusCode::NOT_FOUND })
}

/// Downstream that forwards every request to `origin`.
///
/// # Errors
///
/// Returns `DownstreamError::InvalidOrigin` if `origin` is not an absolute
/// http(s) URL.
pub fn forward_to(origin: &str, client: Client) -> Result<Router, DownstreamError> {
    let invalid = |message: String| DownstreamError::InvalidOrigin {
        url: origin.to_string(),
        message,
    };
    let origin = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", origin.scheme())));
    }

    Ok(Router::new()
        .fallback(forward)
        .with_state(Forwarder { client, origin }))
}

#[derive(Debug, Clone)]
struct Forwarder {
    client: Client,
    origin: Url,
}

async fn forward(State(forwarder): State<Forwarder>, request: Request) -> Response {
    match forwarder.send(request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "downstream forwarding failed");
            (err.status(), err.to_string()).into_response()
        }
    }
}

impl Forwarder {
    async fn send(&self, request: Request) -> Result<Response, DownstreamError> {
        let (parts, body) = request.into_parts();

        // Only path and query come from the request; the origin is fixed
        let mut url = self.origin.clone();
        url.set_path(parts.uri.path());
        url.set_query(parts.uri.query());

        let body = to_bytes(body, MAX_FORWARD_BODY)
            .await
            .map_err(|e| DownstreamError::Body(e.to_string()))?;

        debug!(method = %parts.method, %url, "forwarding downstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(strip_hop_by_hop(parts.headers))
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let headers = strip_hop_by_hop(upstream.headers().clone());
        let bytes = upstream.bytes().await?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Drop headers that describe a single connection.
fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    for name in [
        header::CONNECTION,
        header::HOST,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers
}
