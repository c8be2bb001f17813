//! Container API Handlers
//!
//! HTTP endpoints for listing, stopping, renaming and deleting containers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
};
use dockhand_core::domain::ContainerRecord;
use dockhand_core::dto::container::{ContainerRequest, RenameContainerRequest};

use crate::api::AppState;
use crate::api::error::{ApiResult, decode_json};
use crate::service::{inventory_service, teardown_service};

/// Response header carrying the number of undecodable runtime lines
pub const SKIPPED_RECORDS_HEADER: &str = "x-skipped-records";

/// GET /getContainerList
/// List all containers known to the runtime
pub async fn list_containers(
    State(state): State<AppState>,
) -> ApiResult<(HeaderMap, Json<Vec<ContainerRecord>>)> {
    tracing::debug!("Listing containers");

    let listing = inventory_service::list_containers(state.runtime.as_ref()).await?;

    let mut headers = HeaderMap::new();
    if listing.skipped > 0 {
        tracing::warn!("{} container line(s) could not be decoded", listing.skipped);
        headers.insert(SKIPPED_RECORDS_HEADER, HeaderValue::from(listing.skipped));
    }

    Ok((headers, Json(listing.records)))
}

/// POST /deleteContainer
/// Stop and remove a container
pub async fn delete_container(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: ContainerRequest = decode_json(&body)?;
    req.validate()?;

    tracing::info!("Deleting container: {}", req.container_id);

    teardown_service::teardown_container(state.runtime.as_ref(), &req.container_id).await?;

    Ok(StatusCode::OK)
}

/// POST /stopContainer
/// Stop a container, keeping it for a later restart or removal
pub async fn stop_container(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: ContainerRequest = decode_json(&body)?;
    req.validate()?;

    tracing::info!("Stopping container: {}", req.container_id);

    teardown_service::stop_container(state.runtime.as_ref(), &req.container_id).await?;

    Ok(StatusCode::OK)
}

/// POST /editContainer
/// Rename a container
pub async fn edit_container(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let req: RenameContainerRequest = decode_json(&body)?;
    req.validate()?;

    tracing::info!(
        "Renaming container {} to {}",
        req.container_id,
        req.new_container_name
    );

    teardown_service::rename_container(
        state.runtime.as_ref(),
        &req.container_id,
        &req.new_container_name,
    )
    .await?;

    Ok(StatusCode::OK)
}
