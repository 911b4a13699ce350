//! HTTP route handlers

pub mod chat;
pub mod upload;

use axum::response::{IntoResponse, Json, Response};

pub async fn handle_health() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
