//! REST surface over the memory facade
//!
//! | Method | Path                | Body                      |
//! |--------|---------------------|---------------------------|
//! | GET    | `/`                 |                           |
//! | POST   | `/save_memory`      | `{"text": ...}`           |
//! | GET    | `/get_all_memories` |                           |
//! | POST   | `/search_memories`  | `{"query": ..., "limit"}` |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::facade::MemoryFacade;

/// Application state shared across handlers
pub struct AppState {
    pub facade: MemoryFacade,
    pub default_search_limit: usize,
}

impl AppState {
    pub fn new(facade: MemoryFacade, default_search_limit: usize) -> Self {
        Self {
            facade,
            default_search_limit,
        }
    }
}

pub type SharedState = Arc<AppState>;

// === Wire types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveMemoryRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveMemoryResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchMemoriesRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemoriesResponse {
    pub success: bool,
    pub memories: Vec<String>,
}

/// Error body, `{"detail": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Handler failure; renders as a status code plus [`ErrorResponse`]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Facade rejections of the request itself are 400, store failures 500
    fn from_memory(action: &str, err: Error) -> Self {
        let status = match err {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %err, action, "Memory operation failed");

        Self {
            status,
            detail: format!("Error {action}: {err}"),
        }
    }

    /// Body that failed to parse as the expected JSON
    fn from_rejection(action: &str, rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), action, "Rejected request body");

        Self {
            status: rejection.status(),
            detail: format!("Error {action}: {}", rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

/// Build the router with CORS and request tracing
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/save_memory", post(save_memory))
        .route("/get_all_memories", get(get_all_memories))
        .route("/search_memories", post(search_memories))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails
pub async fn serve(state: SharedState, listener: tokio::net::TcpListener) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}

// === Handlers ===

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "recall memory API is running".to_string(),
    })
}

async fn save_memory(
    State(state): State<SharedState>,
    payload: Result<Json<SaveMemoryRequest>, JsonRejection>,
) -> Result<Json<SaveMemoryResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::from_rejection("saving memory", e))?;

    let ack = state
        .facade
        .save(&req.text)
        .await
        .map_err(|e| ApiError::from_memory("saving memory", e))?;

    Ok(Json(SaveMemoryResponse {
        success: true,
        message: ack.message,
        result: ack.result,
    }))
}

async fn get_all_memories(
    State(state): State<SharedState>,
) -> Result<Json<MemoriesResponse>, ApiError> {
    let memories = state
        .facade
        .get_all()
        .await
        .map_err(|e| ApiError::from_memory("retrieving memories", e))?;

    Ok(Json(MemoriesResponse {
        success: true,
        memories,
    }))
}

async fn search_memories(
    State(state): State<SharedState>,
    payload: Result<Json<SearchMemoriesRequest>, JsonRejection>,
) -> Result<Json<MemoriesResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::from_rejection("searching memories", e))?;
    let limit = req.limit.unwrap_or(state.default_search_limit);

    let memories = state
        .facade
        .search(&req.query, limit)
        .await
        .map_err(|e| ApiError::from_memory("searching memories", e))?;

    Ok(Json(MemoriesResponse {
        success: true,
        memories,
    }))
}
