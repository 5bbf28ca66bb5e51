use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::post,
    Json,
    Router,
};
use log::{ error, info, warn };
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::{ ServeDir, ServeFile };
use uuid::Uuid;

use crate::llm::chat::ChatUpstream;
use crate::models::api::ErrorBody;

pub const INVALID_MESSAGES: &str = "Invalid messages format";
pub const MISSING_API_KEY: &str = "API key configuration is missing";
pub const PROCESSING_FAILED: &str = "An error occurred while processing your request";

#[derive(Clone)]
pub struct AppState {
    /// `None` when the server was started without a credential.
    pub upstream: Option<Arc<dyn ChatUpstream>>,
}

impl AppState {
    pub fn new(upstream: Option<Arc<dyn ChatUpstream>>) -> Self {
        Self { upstream }
    }
}

/// Relay routes plus the page shell: anything outside `/api` that is not a
/// static file resolves to `index.html`.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let shell = ServeDir::new(static_dir)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/chat", post(chat_handler))
        .fallback_service(shell)
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

/// Pulls the `messages` array out of a request body, if it has one.
pub fn extract_messages(body: &[u8]) -> Option<Vec<Value>> {
    let mut value = serde_json::from_slice::<Value>(body).ok()?;
    match value.get_mut("messages")?.take() {
        Value::Array(messages) => Some(messages),
        _ => None,
    }
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    info!("[{}] Received chat request", request_id);

    let Some(messages) = extract_messages(&body) else {
        warn!("[{}] Rejected request without a messages array", request_id);
        return error_response(StatusCode::BAD_REQUEST, ErrorBody::new(INVALID_MESSAGES));
    };

    let Some(upstream) = state.upstream.as_ref() else {
        error!("[{}] API Key is missing", request_id);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(MISSING_API_KEY));
    };

    info!(
        "[{}] Forwarding {} message(s) to model {}",
        request_id,
        messages.len(),
        upstream.model()
    );

    match upstream.complete(messages).await {
        Ok(body) => {
            info!("[{}] Relayed upstream completion", request_id);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("[{}] API Error: {}", request_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_details(PROCESSING_FAILED, e.details())
            )
        }
    }
}
