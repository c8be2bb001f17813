//! Container Teardown
//!
//! Stops a container and then removes it. Removal is only attempted once
//! the stop succeeded; the runtime already treats stopping a stopped
//! container as success.
//!
//! The single-step changes the web front end offers (stop, rename) live
//! here too and report failures the same way.

use thiserror::Error;
use tracing::info;

use crate::collaborator::ContainerRuntime;
use crate::process::ToolError;

#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("Error stopping container {id}: {source}")]
    Stop { id: String, source: ToolError },

    #[error("Error removing container {id}: {source}")]
    Remove { id: String, source: ToolError },

    #[error("Error renaming container {id}: {source}")]
    Rename { id: String, source: ToolError },
}

impl TeardownError {
    pub fn tool_error(&self) -> &ToolError {
        match self {
            TeardownError::Stop { source, .. }
            | TeardownError::Remove { source, .. }
            | TeardownError::Rename { source, .. } => source,
        }
    }
}

/// Stops then removes a container
pub async fn teardown_container(
    runtime: &dyn ContainerRuntime,
    id: &str,
) -> Result<(), TeardownError> {
    stop_container(runtime, id).await?;

    runtime
        .remove_container(id)
        .await
        .map_err(|source| TeardownError::Remove {
            id: id.to_string(),
            source,
        })?;

    info!("Container {} torn down", id);
    Ok(())
}

/// Stops a container without removing it
pub async fn stop_container(runtime: &dyn ContainerRuntime, id: &str) -> Result<(), TeardownError> {
    runtime
        .stop_container(id)
        .await
        .map_err(|source| TeardownError::Stop {
            id: id.to_string(),
            source,
        })
}

/// Renames a container, running or not
pub async fn rename_container(
    runtime: &dyn ContainerRuntime,
    id: &str,
    new_name: &str,
) -> Result<(), TeardownError> {
    runtime
        .rename_container(id, new_name)
        .await
        .map_err(|source| TeardownError::Rename {
            id: id.to_string(),
            source,
        })?;

    info!("Container {} renamed to {}", id, new_name);
    Ok(())
}
