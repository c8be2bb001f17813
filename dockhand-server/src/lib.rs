//! Dockhand Server
//!
//! Turns repository URLs into running containers over HTTP.
//!
//! Architecture:
//! - Configuration: settings from the environment with defaults
//! - Process: the port every external tool invocation goes through
//! - Collaborators: git and docker/podman behind traits
//! - Services: deployment pipeline, container inventory and teardown
//! - API: axum handlers plus static serving of the web front end

pub mod api;
pub mod collaborator;
pub mod config;
pub mod identity;
pub mod process;
pub mod service;

use anyhow::Context;
use std::sync::Arc;

use crate::api::AppState;
use crate::collaborator::{ContainerCli, GitCli};
use crate::config::{Config, IdScheme};
use crate::identity::{
    DeploymentLayout, IdentifierSource, RandomIdentifiers, SequentialIdentifiers,
};
use crate::process::CommandRunner;
use crate::service::{DeploymentPipeline, FailurePolicy};

/// Wires the CLI collaborators and the pipeline described by `config`
pub fn build_state(config: &Config, runner: Arc<dyn CommandRunner>) -> anyhow::Result<AppState> {
    let git = Arc::new(
        GitCli::new(runner.clone(), config.git_program.clone()).with_timeout(config.fetch_timeout),
    );
    let containers = Arc::new(
        ContainerCli::new(runner, config.container_program.clone())
            .with_timeouts(config.container_timeouts()),
    );

    let ids: Arc<dyn IdentifierSource> = match config.id_scheme {
        IdScheme::Uuid => Arc::new(RandomIdentifiers::new()),
        IdScheme::Sequential => Arc::new(
            SequentialIdentifiers::resume_after(&config.repositories_root).with_context(|| {
                format!(
                    "Failed to scan repositories root {}",
                    config.repositories_root.display()
                )
            })?,
        ),
    };

    let layout = DeploymentLayout::new(&config.repositories_root, config.image_prefix.clone());

    let pipeline = DeploymentPipeline::new(git, containers.clone(), containers.clone(), ids, layout)
        .with_policy(FailurePolicy {
            rollback_on_failure: config.rollback_on_failure,
        });

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        runtime: containers,
    })
}
