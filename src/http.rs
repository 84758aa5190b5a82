use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{LogReaderError, Result};
use crate::mcp::{error_response, process_request, run_scan, RpcRequest};
use crate::scanner::LogScanner;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<LogScanner>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogfilesQuery {
    #[serde(default)]
    pub filename_search_string: Option<String>,
}

async fn logfiles_handler(
    State(state): State<AppState>,
    q: std::result::Result<Query<LogfilesQuery>, QueryRejection>,
) -> impl IntoResponse {
    let q = match q {
        Ok(Query(q)) => q,
        Err(e) => {
            return ErrorResponse {
                error: format!("invalid query: {e}"),
            }
            .into_response()
        }
    };

    match run_scan(state.scanner, q.filename_search_string).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn rpc_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RpcRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            let resp = error_response(Value::Null, -32700, format!("parse error: {e}"));
            return (StatusCode::BAD_REQUEST, Json(resp)).into_response();
        }
    };

    match process_request(state.scanner, req).await {
        Some(resp) => (StatusCode::OK, Json(resp)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub fn build_router(scanner: Arc<LogScanner>) -> Router {
    let state = AppState { scanner };
    Router::new()
        .route("/logfiles", get(logfiles_handler))
        .route("/rpc", post(rpc_handler))
        .with_state(state)
}

pub async fn serve_http(scanner: Arc<LogScanner>, server: &ServerConfig) -> Result<()> {
    let router = build_router(scanner);
    let addr = format!("{}:{}", server.http_addr, server.http_port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LogReaderError::ConfigError(format!("bind {addr} failed: {e}")))?;
    info!("HTTP server listening on http://{}", addr);
    axum::serve(listener, router).await.map_err(Into::into)
}
