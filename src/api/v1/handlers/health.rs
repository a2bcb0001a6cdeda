/*
 * Responsibility
 * - GET /health (liveness; sits outside the auth gate)
 * - Unknown-route fallback with the standard JSON error body
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::error::AppError;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

pub async fn not_found() -> AppError {
    AppError::not_found("route")
}
