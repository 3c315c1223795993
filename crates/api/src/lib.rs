mod rate_limit;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use relay_agents::{AssistantConfig, ConnectorStatus, LiveAgent};
use relay_observability::{AppMetrics, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use crate::rate_limit::ClientRateLimiter;

const MAX_COMMAND_TEXT_LEN: usize = 4_000;
const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: "dev-relay-key".to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 60,
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_key: env::var("RELAY_API_KEY").unwrap_or(defaults.api_key),
            rate_limit_window: env::var("RELAY_RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: env::var("RELAY_RATE_LIMIT_MAX")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<LiveAgent>,
    pub metrics: Arc<AppMetrics>,
    pub app_name: String,
    pub api_key: String,
    pub limiter: ClientRateLimiter,
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_name: String,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    connectors: ConnectorStatus,
}

pub async fn build_app(config: AssistantConfig) -> Result<Router> {
    build_app_with_settings(config, ApiSettings::from_env()).await
}

pub async fn build_app_with_settings(
    config: AssistantConfig,
    settings: ApiSettings,
) -> Result<Router> {
    config.write_google_secrets().await?;

    let metrics = AppMetrics::shared();
    let agent = LiveAgent::from_config(&config, metrics.clone())?.without_speaker();

    let state = ApiState {
        agent: Arc::new(agent),
        metrics,
        app_name: config.app_name,
        api_key: settings.api_key,
        limiter: ClientRateLimiter::new(settings.rate_limit_window, settings.rate_limit_max),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/classify", post(classify))
        .route("/v1/command", post(command))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        app_name: state.app_name.clone(),
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        connectors: state.agent.connector_status(),
    };
    (StatusCode::OK, Json(payload))
}

async fn classify(
    State(state): State<ApiState>,
    Json(request): Json<CommandRequest>,
) -> Response {
    if let Some(rejection) = reject_oversized(&request.text) {
        return rejection;
    }

    (StatusCode::OK, Json(state.agent.classify(&request.text))).into_response()
}

async fn command(State(state): State<ApiState>, Json(request): Json<CommandRequest>) -> Response {
    if let Some(rejection) = reject_oversized(&request.text) {
        return rejection;
    }

    let reply = state.agent.handle_text(&request.text).await;
    (StatusCode::OK, Json(reply)).into_response()
}

fn reject_oversized(text: &str) -> Option<Response> {
    if text.chars().count() <= MAX_COMMAND_TEXT_LEN {
        return None;
    }

    Some(
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "text_too_long",
                "message": format!("command text is limited to {MAX_COMMAND_TEXT_LEN} characters")
            })),
        )
            .into_response(),
    )
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    if client_key(&request) != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    // Runs inside the key check, so only authenticated keys reach the limiter.
    if !state.limiter.allow(client_key(&request)) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this client"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

fn client_key(request: &Request<Body>) -> &str {
    request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
