//! HTTP server: axum routes over the core flows

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use summaraize_core::config::{Config, GatewayConfig};
use summaraize_core::flows::{self, AskOutput, OptimizeOutput, SummarizeOutput};
use summaraize_core::status::{ProviderStatus, provider_report};
use summaraize_core::{FallbackRouter, FlowError, GenerationError};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::*;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<FallbackRouter>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(router: Arc<FallbackRouter>) -> Self {
        Self {
            router,
            started_at: Utc::now(),
        }
    }
}

/// Which flow an error came from; picks the user-facing wording
#[derive(Debug, Clone, Copy)]
enum Operation {
    Summarize,
    Optimize,
    Ask,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Optimize => "optimize",
            Self::Ask => "ask",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Summarize => "Failed to generate summary. Please try again.",
            Self::Optimize => "Failed to generate optimizations. Please try again.",
            Self::Ask => "Failed to get an answer. Please try again.",
        }
    }
}

/// Error returned from a handler as `(status, ErrorResponse)`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let (status, code) = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => (StatusCode::PAYLOAD_TOO_LARGE, ERR_PAYLOAD_TOO_LARGE),
            _ => (StatusCode::BAD_REQUEST, ERR_INVALID_INPUT),
        };
        warn!(status = status.as_u16(), error = %rejection.body_text(), "Rejected request body");
        Self {
            status,
            body: ErrorResponse::new(code, rejection.body_text()),
        }
    }
}

fn flow_error(op: Operation, request_id: Uuid, err: FlowError) -> ApiError {
    warn!(%request_id, operation = op.name(), error = %err, "Request failed");
    let (status, code, message) = match &err {
        FlowError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, ERR_INVALID_INPUT, msg.to_string()),
        FlowError::Generation(GenerationError::NoProviderAvailable) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ERR_NO_PROVIDER,
            "No AI provider is configured.".to_string(),
        ),
        FlowError::Generation(GenerationError::AllProvidersExhausted { attempts })
            if attempts.is_empty() =>
        {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ERR_NO_PROVIDER,
                "No AI provider is configured.".to_string(),
            )
        }
        FlowError::Generation(_) | FlowError::OperationFailed { .. } => (
            StatusCode::BAD_GATEWAY,
            ERR_GENERATION_FAILED,
            op.failure_message().to_string(),
        ),
    };
    ApiError {
        status,
        body: ErrorResponse::new(code, message),
    }
}

#[derive(Serialize)]
struct ProvidersResponse {
    providers: Vec<ProviderStatus>,
}

async fn summarize_handler(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeOutput>, ApiError> {
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();
    info!(%request_id, chars = req.text.len(), "Summarize request");
    let output = flows::summarize(&state.router, &req.text, &req.prompt)
        .await
        .map_err(|e| flow_error(Operation::Summarize, request_id, e))?;
    info!(%request_id, provider = output.provider.as_str(), "Summarize complete");
    Ok(Json(output))
}

async fn optimize_handler(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeOutput>, ApiError> {
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();
    info!(%request_id, chars = req.transcript.len(), "Optimize request");
    let output = flows::optimize_transcript(&state.router, &req.transcript)
        .await
        .map_err(|e| flow_error(Operation::Optimize, request_id, e))?;
    Ok(Json(output))
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskOutput>, ApiError> {
    let Json(req) = payload?;
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        document_chars = req.document_content.len(),
        "Ask request"
    );
    let output = flows::ask_document_question(&state.router, &req.document_content, &req.question)
        .await
        .map_err(|e| flow_error(Operation::Ask, request_id, e))?;
    Ok(Json(output))
}

async fn providers_handler(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: provider_report(&state.router),
    })
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Build the axum application
pub fn app(state: AppState, config: &GatewayConfig) -> Router {
    let router = Router::new()
        .route("/api/summarize", post(summarize_handler))
        .route("/api/optimize", post(optimize_handler))
        .route("/api/ask", post(ask_handler))
        .route("/api/providers", get(providers_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state);

    match cors_layer(&config.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// The gateway: shared state plus listener settings
pub struct GatewayServer {
    state: AppState,
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: &Config) -> Self {
        let router = Arc::new(FallbackRouter::from_config(&config.providers));
        Self::with_router(router, config.gateway.clone())
    }

    pub fn with_router(router: Arc<FallbackRouter>, config: GatewayConfig) -> Self {
        Self {
            state: AppState::new(router),
            config,
        }
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind gateway to {}", addr))?;
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().context("Listener has no local address")?;
        let available = self
            .state
            .router
            .providers()
            .iter()
            .filter(|p| p.is_available())
            .count();
        info!(
            addr = %local,
            providers = self.state.router.providers().len(),
            available,
            "Gateway listening"
        );
        if available == 0 {
            warn!("No provider has a credential; generation requests will fail");
        }

        let app = app(self.state, &self.config);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Gateway server error")?;
        info!("Gateway stopped");
        Ok(())
    }
}
