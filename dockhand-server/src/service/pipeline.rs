//! Deployment Pipeline
//!
//! Turns a repository URL into a running container:
//! 1. allocate a deployment identifier
//! 2. fetch: clone the repository into `<repositories_root>/<id>`
//! 3. build: tag an image `<image_prefix><id>` from the clone
//! 4. run: start the image detached, publishing the requested port
//!
//! Stages run strictly in order and the first failure ends the deployment.
//! Nothing is retried. Whether completed stages are undone after a later
//! failure is decided by [`FailurePolicy`]; by default they are left in
//! place and the caller cleans up.

use chrono::Utc;
use dockhand_core::domain::{Deployment, DeploymentId, Stage};
use dockhand_core::dto::deploy::{ContainerPort, DeployRequest};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::collaborator::{ContainerRuntime, ImageBuilder, VersionControl};
use crate::identity::{DeploymentLayout, IdentifierSource};
use crate::process::ToolError;

/// A deployment that stopped at one of the pipeline stages
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Error cloning repository: {0}")]
    Fetch(ToolError),

    #[error("Error building container image: {0}")]
    Build(ToolError),

    #[error("Error running container: {0}")]
    Run(ToolError),
}

impl DeployError {
    /// Stage the deployment failed in
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::Fetch(_) => Stage::Fetch,
            DeployError::Build(_) => Stage::Build,
            DeployError::Run(_) => Stage::Run,
        }
    }

    pub fn tool_error(&self) -> &ToolError {
        match self {
            DeployError::Fetch(e) | DeployError::Build(e) | DeployError::Run(e) => e,
        }
    }
}

/// What happens to completed stages when a later stage fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Remove the built image and the cloned directory after a failure.
    /// Off by default: artifacts are kept for inspection.
    pub rollback_on_failure: bool,
}

/// Sequences fetch, build and run for one deployment at a time per call
///
/// The pipeline holds no per-deployment state, so one instance serves all
/// concurrent requests. Deployments are kept apart by their identifiers.
pub struct DeploymentPipeline {
    vcs: Arc<dyn VersionControl>,
    builder: Arc<dyn ImageBuilder>,
    runtime: Arc<dyn ContainerRuntime>,
    ids: Arc<dyn IdentifierSource>,
    layout: DeploymentLayout,
    policy: FailurePolicy,
}

impl DeploymentPipeline {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        builder: Arc<dyn ImageBuilder>,
        runtime: Arc<dyn ContainerRuntime>,
        ids: Arc<dyn IdentifierSource>,
        layout: DeploymentLayout,
    ) -> Self {
        Self {
            vcs,
            builder,
            runtime,
            ids,
            layout,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Deploys a repository
    ///
    /// The request is expected to be validated already.
    ///
    /// # Returns
    /// The deployment on success, or the first stage failure
    pub async fn deploy(&self, request: &DeployRequest) -> Result<Deployment, DeployError> {
        let id = self.ids.next_id();
        let span = info_span!("deploy", id = %id);

        self.deploy_as(id, request).instrument(span).await
    }

    async fn deploy_as(
        &self,
        id: DeploymentId,
        request: &DeployRequest,
    ) -> Result<Deployment, DeployError> {
        let repo_url = request.repo_url.trim();
        let port = request.container_port;
        let repository_path = self.layout.repository_path(&id);
        let image = self.layout.image_name(&id);

        info!("Deploying {} as {} on port {}", repo_url, image, port);

        if let Err(e) = self.fetch(repo_url, &repository_path).await {
            error!("Fetch failed: {}", e);
            return Err(e);
        }

        if let Err(e) = self.build(&image, &repository_path).await {
            error!("Build failed: {}", e);
            self.compensate(Stage::Build, &repository_path, &image).await;
            return Err(e);
        }

        let container_id = match self.run(&image, port).await {
            Ok(container_id) => container_id,
            Err(e) => {
                error!("Run failed: {}", e);
                self.compensate(Stage::Run, &repository_path, &image).await;
                return Err(e);
            }
        };

        info!("Deployment complete: container {}", container_id);

        Ok(Deployment {
            id,
            repo_url: repo_url.to_string(),
            repository_path: repository_path.display().to_string(),
            image,
            container_id,
            port: port.get(),
            created_at: Utc::now(),
        })
    }

    async fn fetch(&self, repo_url: &str, destination: &Path) -> Result<(), DeployError> {
        tokio::fs::create_dir_all(&self.layout.repositories_root)
            .await
            .map_err(|source| {
                DeployError::Fetch(ToolError::Io {
                    context: format!(
                        "failed to create repositories directory {}",
                        self.layout.repositories_root.display()
                    ),
                    source,
                })
            })?;

        self.vcs
            .clone_repository(repo_url, destination)
            .await
            .map_err(DeployError::Fetch)
    }

    async fn build(&self, image: &str, context: &Path) -> Result<(), DeployError> {
        self.builder
            .build_image(image, context)
            .await
            .map_err(DeployError::Build)
    }

    async fn run(&self, image: &str, port: ContainerPort) -> Result<String, DeployError> {
        self.runtime
            .run_container(image, port)
            .await
            .map_err(DeployError::Run)
    }

    /// Best-effort undo of the stages that completed before `failed`
    ///
    /// Failures here are logged and never replace the stage error.
    async fn compensate(&self, failed: Stage, repository_path: &Path, image: &str) {
        if !self.policy.rollback_on_failure {
            debug!("Rollback disabled, keeping artifacts of failed {} stage", failed);
            return;
        }

        info!("Rolling back after {} failure", failed);

        if failed == Stage::Run {
            if let Err(e) = self.builder.remove_image(image).await {
                warn!("Failed to remove image {}: {}", image, e);
            }
        }

        match tokio::fs::remove_dir_all(repository_path).await {
            Ok(()) => debug!("Removed {}", repository_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", repository_path.display(), e),
        }
    }
}
