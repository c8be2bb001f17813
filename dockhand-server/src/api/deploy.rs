//! Deploy API Handler
//!
//! HTTP endpoint that runs the deployment pipeline.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use dockhand_core::domain::Deployment;
use dockhand_core::dto::deploy::DeployRequest;

use crate::api::AppState;
use crate::api::error::{ApiResult, decode_json};

/// POST /cloneRepo
/// Clone, build and run a repository
///
/// Responds `201 Created` with the deployment once the container is running.
pub async fn clone_repo(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Deployment>)> {
    let req: DeployRequest = decode_json(&body)?;
    req.validate()?;

    tracing::info!(
        "Deploy requested for {} on port {}",
        req.repo_url,
        req.container_port
    );

    let deployment = state.pipeline.deploy(&req).await?;

    Ok((StatusCode::CREATED, Json(deployment)))
}
