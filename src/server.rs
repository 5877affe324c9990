//! HTTP transport: JSON-RPC on `/rpc`, plain REST calls on `/api/tools`

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::Result;
use crate::config::ServerConfig;
use crate::rpc::RpcHandler;
use crate::tools::{ErrorCode, ToolError};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Slack on top of the pipeline deadline so the pipeline reports its own timeout first
const TIMEOUT_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct AppState {
    handler: RpcHandler,
    started_at: DateTime<Utc>,
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = match self.code() {
            ErrorCode::MethodNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidParams => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.body())).into_response()
    }
}

/// Build the application router
pub fn router(handler: RpcHandler, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        handler,
        started_at: Utc::now(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/rpc", post(rpc))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(call_tool))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout + TIMEOUT_GRACE))
        .layer(cors)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "startedAt": state.started_at.to_rfc3339(),
        "tools": state.handler.registry().list_tools().len(),
        "cachedAnalyses": state.handler.registry().service().cached_analyses(),
    }))
}

async fn rpc(State(state): State<AppState>, body: String) -> Response {
    match state.handler.handle_line(&body).await {
        Some(text) => ([(header::CONTENT_TYPE, "application/json")], text).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn list_tools(State(state): State<AppState>) -> Response {
    Json(json!({ "tools": state.handler.registry().list_tools() })).into_response()
}

async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                return ToolError::InvalidParams(format!("request body is not JSON: {e}"))
                    .into_response();
            }
        }
    };

    match state.handler.registry().dispatch(&name, args).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Serve until ctrl-c
pub async fn run(
    handler: RpcHandler,
    config: &ServerConfig,
    request_timeout: Duration,
) -> Result<()> {
    let app = router(handler, request_timeout);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
