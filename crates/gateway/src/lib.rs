//! HTTP API gateway for Groundwire.
//!
//! Exposes the pipeline to a chat front-end:
//!
//! - `GET /health`: liveness and version
//! - `POST /v1/chat`: `{"query", "history": [["user", "assistant"], ...]}`
//!   → `{"response"}`
//!
//! The gateway keeps no sessions. The front-end owns the conversation and
//! sends the whole history with every request.
//!
//! Built on Axum for high performance async HTTP.

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use groundwire_agent::RagPipeline;
use groundwire_config::{AppConfig, GatewayConfig};
use groundwire_core::Error;
use groundwire_core::message::Exchange;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<RagPipeline>,
    pub start_time: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self {
            pipeline,
            start_time: Utc::now(),
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request id (`x-request-id`) on every response
/// - CORS restricted to the configured origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS: same-origin only unless origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Builds the pipeline once (probing the encoder and readying the index)
/// and shares it across all requests.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = Arc::new(groundwire_agent::bootstrap(&config).await?);
    let state = Arc::new(GatewayState::new(pipeline));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Tag each request with an id and echo it back in `x-request-id`.
async fn request_id_middleware(mut req: axum::extract::Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&id) {
        req.headers_mut().insert("x-request-id", value.clone());
        let mut response = next.run(req).await;
        response.headers_mut().insert("x-request-id", value);
        response
    } else {
        next.run(req).await
    }
}

// --- Errors ---

/// Error body: `{"error": "...", "kind": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// Failures a handler can return.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// The body could not be read or decoded; keeps axum's status code.
    InvalidBody(JsonRejection),
    Pipeline(Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Pipeline(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody(rejection) => rejection.status(),
            Self::Pipeline(Error::Config { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Pipeline(Error::IndexUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Pipeline(Error::Encoding(_) | Error::Retrieval(_) | Error::Generation(_)) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) | Self::InvalidBody(_) => "bad_request",
            Self::Pipeline(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            kind: self.kind().to_string(),
            error: match &self {
                Self::BadRequest(msg) => msg.clone(),
                Self::InvalidBody(rejection) => rejection.body_text(),
                Self::Pipeline(e) => e.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.start_time).num_seconds(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<Exchange>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }

    info!(
        query_len = payload.query.len(),
        history = payload.history.len(),
        "Chat request received"
    );

    match state.pipeline.generate(&payload.query, &payload.history).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Chat request failed");
            Err(e.into())
        }
    }
}
