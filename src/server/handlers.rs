//! server::handlers
//!
//! Handlers for the two lookup routes.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::forge::Credential;
use crate::lookup;

const INVALID_REPOS: &str = "Invalid request: repos must be an array of repository strings";
const MISSING_REPO: &str = "Missing required query parameter: repo";

#[derive(Debug, Deserialize)]
pub(super) struct SingleQuery {
    repo: Option<String>,
}

/// `POST /api/repos-info`
///
/// Body: `{"repos": ["owner/name", "https://github.com/owner/name", ...]}`.
/// Responds with a map from each input string to its lookup.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub(super) async fn bulk(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(body_error)?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Internal(format!("Invalid JSON body: {}", e)))?;
    let repos = parse_repo_list(&payload)?;

    info!(count = repos.len(), "bulk repository lookup");

    let credential = route_credential(&state, state.settings.bulk_credential);
    let results = lookup::fetch_batch(
        state.host.as_ref(),
        &repos,
        credential,
        state.settings.max_concurrency,
    )
    .await;

    Ok(cached_json(&state, &results))
}

/// `GET /api/repo-info?repo=<reference>`
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub(super) async fn single(
    State(state): State<AppState>,
    query: Result<Query<SingleQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let repo = query
        .repo
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_REPO.to_string()))?;

    info!(%repo, "single repository lookup");

    let credential = route_credential(&state, state.settings.single_credential);
    let result = lookup::fetch_repo_info(state.host.as_ref(), &repo, credential).await;

    Ok(cached_json(&state, &result))
}

pub(super) async fn bulk_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed { allow: "POST" }
}

pub(super) async fn single_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed { allow: "GET" }
}

/// Extract `repos` from the bulk body.
fn parse_repo_list(payload: &Value) -> Result<Vec<String>, ApiError> {
    let invalid = || ApiError::BadRequest(INVALID_REPOS.to_string());

    payload
        .get("repos")
        .and_then(Value::as_array)
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Map a body read failure onto the JSON error model.
fn body_error(rejection: BytesRejection) -> ApiError {
    let message = rejection.body_text();
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::Internal(message)
    }
}

fn route_credential(state: &AppState, forward: bool) -> Option<&Credential> {
    if forward {
        state.settings.credential.as_ref()
    } else {
        None
    }
}

/// 200 JSON response with the configured `Cache-Control`.
fn cached_json<T: Serialize>(state: &AppState, body: &T) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, state.settings.cache_control())],
        Json(body),
    )
        .into_response()
}
