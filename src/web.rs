use crate::{GeneratedHints, HintGenerator, HintRequest, UsageStats};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

type SharedState = Arc<AppState>;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<HintGenerator>,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

/// Serves the hint API until ctrl-c or SIGTERM.
///
/// The generator is built by the caller outside the runtime, since its HTTP
/// client is blocking.
pub async fn serve(config: WebConfig, generator: Arc<HintGenerator>) -> Result<(), WebError> {
    let llm = match generator.llm().readiness() {
        Ok(()) => "enabled".to_string(),
        Err(reason) => reason.to_string(),
    };
    let state = Arc::new(AppState { generator });
    let router = build_router(state);
    info!(%config.addr, base = %config.base_url, %llm, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/hints", post(api_hints))
        .route("/api/hints/:level", post(api_hint_level))
        .route("/api/usage", get(api_usage))
        .route("/api/usage/reset", post(api_usage_reset))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Generation blocks on the LLM call, so it runs off the async workers.
async fn generate(state: SharedState, request: HintRequest) -> Result<GeneratedHints, ApiError> {
    tokio::task::spawn_blocking(move || state.generator.generate(&request))
        .await
        .map_err(|err| {
            warn!(error = %err, "hint generation task failed");
            ApiError::internal("hint generation failed")
        })
}

async fn api_hints(
    State(state): State<SharedState>,
    Json(request): Json<HintRequest>,
) -> Result<Json<GeneratedHints>, ApiError> {
    generate(state, request).await.map(Json)
}

#[derive(Serialize)]
struct LevelPayload {
    level: usize,
    hint: String,
    source: crate::HintSource,
}

async fn api_hint_level(
    State(state): State<SharedState>,
    Path(level): Path<usize>,
    Json(request): Json<HintRequest>,
) -> Result<Json<LevelPayload>, ApiError> {
    if !(1..=4).contains(&level) {
        return Err(ApiError::bad_request(format!(
            "hint level must be between 1 and 4, got {level}"
        )));
    }
    let generated = generate(state, request).await?;
    let hint = generated
        .hints
        .level(level)
        .map(str::to_string)
        .ok_or_else(|| ApiError::internal("missing hint level"))?;
    Ok(Json(LevelPayload {
        level,
        hint,
        source: generated.source,
    }))
}

async fn api_usage(State(state): State<SharedState>) -> Json<UsageStats> {
    Json(state.generator.usage().stats())
}

async fn api_usage_reset(State(state): State<SharedState>) -> Json<UsageStats> {
    let usage = state.generator.usage();
    usage.reset();
    info!("LLM usage counters reset");
    Json(usage.stats())
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let llm = match state.generator.llm().readiness() {
        Ok(()) => "enabled".to_string(),
        Err(reason) => reason.to_string(),
    };
    Json(json!({ "status": "ok", "llm": llm }))
}
