//! Liveness endpoint
//!
//! Answers without touching git or the container runtime, so it stays up
//! even when the tools are missing.

use axum::http::StatusCode;

/// GET /health
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
