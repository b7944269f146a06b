//! HTTP surface: `GET /health`, `GET /test-auth` and `POST /review`.

use crate::error::{ReviewError, Result};
use crate::models::{ReviewRequest, ReviewResult};
use crate::service::ReviewService;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, warn, Instrument};
use uuid::Uuid;

/// Header-based API key check
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    header: HeaderName,
    key: String,
}

impl ApiKeyAuth {
    /// Expects `key` in the header named `header`
    pub fn new(header: &str, key: impl Into<String>) -> Result<Self> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| ReviewError::Config(format!("Invalid API key header name '{}': {}", header, e)))?;
        Ok(Self {
            header,
            key: key.into(),
        })
    }

    /// Returns the presented key if it matches
    pub fn verify(&self, headers: &HeaderMap) -> Result<String> {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .filter(|presented| *presented == self.key)
            .map(str::to_string)
            .ok_or(ReviewError::Unauthorized)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<ReviewService>,
    auth: Arc<ApiKeyAuth>,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Bundles the review service with the key check
    pub fn new(service: ReviewService, auth: ApiKeyAuth) -> Self {
        Self {
            service: Arc::new(service),
            auth: Arc::new(auth),
            started_at: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
}

/// Error wrapper rendering `{"detail": ...}` with the matching status
#[derive(Debug)]
pub struct ApiError(pub ReviewError);

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(category = self.0.category(), error = %self.0, "Request failed");
        } else {
            warn!(category = self.0.category(), error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ReviewError::InvalidRequest {
            status: rejection.status().as_u16(),
            message: rejection.body_text(),
        })
    }
}

/// Key that passed the check, for handlers that echo it
#[derive(Debug, Clone)]
struct AuthenticatedKey(String);

/// Builds the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/test-auth", get(test_auth))
        .route("/review", post(review))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let key = state.auth.verify(request.headers())?;
    request.extensions_mut().insert(AuthenticatedKey(key));
    Ok(next.run(request).await)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    Json(HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "healthy".to_string(),
        timestamp: now,
        uptime: (now - state.started_at).num_seconds().max(0) as u64,
    })
}

async fn test_auth(Extension(AuthenticatedKey(key)): Extension<AuthenticatedKey>) -> Json<serde_json::Value> {
    Json(json!({ "api_key": key }))
}

async fn review(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReviewRequest>, JsonRejection>,
) -> std::result::Result<Json<ReviewResult>, ApiError> {
    let Json(request) = payload?;
    let span = tracing::info_span!("review", request_id = %Uuid::new_v4(), repository = %request.github_repo_url);
    let result = state.service.review(&request).instrument(span).await?;
    Ok(Json(result))
}
