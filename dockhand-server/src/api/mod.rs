//! API Module
//!
//! HTTP API layer. Paths match the ones the bundled web front end calls;
//! every other path is served from the front end's build directory.

pub mod container;
pub mod deploy;
pub mod error;
pub mod health;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::collaborator::ContainerRuntime;
use crate::service::DeploymentPipeline;

/// Application state shared with handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DeploymentPipeline>,

    /// Used directly by the inventory and teardown endpoints
    pub runtime: Arc<dyn ContainerRuntime>,
}

/// Create the main API router with all endpoints
///
/// # Arguments
/// * `state` - Pipeline and runtime shared by the handlers
/// * `static_dir` - Web front end assets served for unmatched paths
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Deployment
        .route("/cloneRepo", post(deploy::clone_repo).fallback(only_post))
        // Container endpoints
        .route(
            "/getContainerList",
            get(container::list_containers).fallback(only_get),
        )
        .route(
            "/deleteContainer",
            post(container::delete_container).fallback(only_post),
        )
        .route(
            "/stopContainer",
            post(container::stop_container).fallback(only_post),
        )
        .route(
            "/editContainer",
            post(container::edit_container).fallback(only_post),
        )
        // Web front end
        .fallback_service(ServeDir::new(static_dir))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn only_post() -> ApiError {
    ApiError::MethodNotAllowed(Method::POST)
}

async fn only_get() -> ApiError {
    ApiError::MethodNotAllowed(Method::GET)
}
