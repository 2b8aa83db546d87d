//! HTTP surface for the triage engine
//!
//! # Endpoints
//!
//! - GET /          - Service description
//! - POST /diagnose - Triage a symptom description
//! - GET /history   - All logged conversations, oldest first
//! - GET /health    - Liveness plus model/log configuration
//!
//! Browsers are only admitted from the configured CORS origins.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::types::TriageRequest;
use sdk::EngineError;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use triage_engine::config::ServerConfig;
use triage_engine::triage::TriageEngine;

/// Response header set when the exchange could not be written to the log
pub const LOG_STATUS_HEADER: &str = "x-triage-log-status";

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    engine: Arc<TriageEngine>,
}

impl AppState {
    pub fn new(engine: Arc<TriageEngine>) -> Self {
        Self { engine }
    }
}

/// Body of `POST /diagnose`
#[derive(Debug, Deserialize)]
struct DiagnoseRequest {
    symptoms: String,
}

/// Build the application router
///
/// Origins that are not valid header values are skipped with a warning.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index_handler))
        .route("/diagnose", post(diagnose_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Running HTTP server
pub struct ApiServer {
    addr: SocketAddr,
    engine: Arc<TriageEngine>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Bind `config.host:config.port` and start serving in the background
    ///
    /// Port 0 binds a random free port; see [`ApiServer::addr`].
    pub async fn start(engine: Arc<TriageEngine>, config: &ServerConfig) -> Result<Self, EngineError> {
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;

        let app = router(AppState::new(Arc::clone(&engine)), &config.allowed_origins);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tracing::info!("API server listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                    tracing::info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("API server error: {}", e);
                });
        });

        Ok(Self {
            addr,
            engine,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Address the server is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections, wait for in-flight requests, then close
    /// the conversation log
    pub async fn stop(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("API server task failed: {}", e);
            }
        }
        if let Err(e) = self.engine.shutdown().await {
            tracing::error!("Failed to close conversation log: {}", e);
        }
        tracing::info!("API server stopped");
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn index_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Symptom Triage API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "diagnose": "POST /diagnose",
            "history": "GET /history",
            "health": "GET /health"
        },
        "model_available": state.engine.model_configured()
    }))
}

async fn diagnose_handler(
    State(state): State<AppState>,
    payload: Result<Json<DiagnoseRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let request = match TriageRequest::new(payload.symptoms) {
        Ok(request) => request,
        Err(_) => {
            return error_response(StatusCode::BAD_REQUEST, "Please describe your symptoms");
        }
    };

    let outcome = state.engine.triage(&request).await;

    let mut response = Json(json!({
        "advice": outcome.result.advice,
        "severity": outcome.result.severity,
        "timestamp": outcome.timestamp,
    }))
    .into_response();

    if outcome.log_error.is_some() {
        response.headers_mut().insert(
            HeaderName::from_static(LOG_STATUS_HEADER),
            HeaderValue::from_static("failed"),
        );
    }

    response
}

async fn history_handler(State(state): State<AppState>) -> Response {
    match state.engine.history().await {
        Ok(conversations) => Json(json!({ "conversations": conversations })).into_response(),
        Err(e) => {
            tracing::error!("Failed to read conversation history: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "model_configured": state.engine.model_configured(),
        "log_backend": state.engine.log().backend(),
    }))
}
