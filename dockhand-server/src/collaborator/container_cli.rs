//! Docker/Podman command-line collaborator
//!
//! Both tools accept the same sub-commands for everything Dockhand needs,
//! so one implementation serves as image builder and container runtime:
//! - `build -t <image> <context>` / `rmi <image>`
//! - `run -d -p <port>:<port> <image>`
//! - `ps -a --format {{json .}}`
//! - `stop -- <id>` / `rm -- <id>` / `rename -- <id> <name>`

use async_trait::async_trait;
use dockhand_core::dto::deploy::ContainerPort;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{ContainerRuntime, ImageBuilder};
use crate::process::{CommandRunner, Invocation, ProcessOutput, ToolError};

/// Timeouts applied to the different container tool invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerTimeouts {
    pub build: Duration,
    pub run: Duration,

    /// `ps`, `stop`, `rm` and `rmi`
    pub command: Duration,
}

impl Default for ContainerTimeouts {
    fn default() -> Self {
        Self {
            build: Duration::from_secs(1800),
            run: Duration::from_secs(120),
            command: Duration::from_secs(60),
        }
    }
}

/// Container build tool and runtime backed by the `docker` or `podman` CLI
pub struct ContainerCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    timeouts: ContainerTimeouts,
}

impl ContainerCli {
    /// # Arguments
    /// * `runner` - Executes the CLI invocations
    /// * `program` - `docker`, `podman` or a path to either
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeouts: ContainerTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ContainerTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    async fn execute(&self, invocation: Invocation) -> Result<ProcessOutput, ToolError> {
        self.runner
            .run(&invocation)
            .await?
            .into_result(&invocation)
    }
}

#[async_trait]
impl ImageBuilder for ContainerCli {
    async fn build_image(&self, image: &str, context: &Path) -> Result<(), ToolError> {
        info!("Building image {} from {}", image, context.display());

        self.execute(
            Invocation::new(&self.program)
                .args(["build", "-t", image])
                .arg(context.display().to_string())
                .timeout(Some(self.timeouts.build)),
        )
        .await?;

        info!("Image {} built", image);
        Ok(())
    }

    async fn remove_image(&self, image: &str) -> Result<(), ToolError> {
        debug!("Removing image {}", image);

        self.execute(
            Invocation::new(&self.program)
                .args(["rmi", image])
                .timeout(Some(self.timeouts.command)),
        )
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for ContainerCli {
    async fn run_container(&self, image: &str, port: ContainerPort) -> Result<String, ToolError> {
        info!("Starting container from {} on port {}", image, port);

        let invocation = Invocation::new(&self.program)
            .args(["run", "-d", "-p"])
            .arg(format!("{}:{}", port, port))
            .arg(image)
            .capture_stdout()
            .timeout(Some(self.timeouts.run));
        let invocation_line = invocation.command_line();

        let output = self.execute(invocation).await?;

        // `run -d` prints the new container ID, possibly after pull progress
        let Some(container_id) = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
        else {
            return Err(ToolError::Failed {
                command: invocation_line,
                status: "exit code 0".to_string(),
                diagnostic: "runtime printed no container ID".to_string(),
            });
        };

        info!("Container {} started from {}", container_id, image);
        Ok(container_id)
    }

    async fn list_containers(&self) -> Result<String, ToolError> {
        let output = self
            .execute(
                Invocation::new(&self.program)
                    .args(["ps", "-a", "--format", "{{json .}}"])
                    .capture_stdout()
                    .timeout(Some(self.timeouts.command)),
            )
            .await?;

        Ok(output.stdout)
    }

    async fn stop_container(&self, id: &str) -> Result<(), ToolError> {
        info!("Stopping container {}", id);

        self.execute(
            Invocation::new(&self.program)
                .args(["stop", "--", id])
                .timeout(Some(self.timeouts.command)),
        )
        .await?;

        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), ToolError> {
        info!("Removing container {}", id);

        self.execute(
            Invocation::new(&self.program)
                .args(["rm", "--", id])
                .timeout(Some(self.timeouts.command)),
        )
        .await?;

        Ok(())
    }

    async fn rename_container(&self, id: &str, new_name: &str) -> Result<(), ToolError> {
        info!("Renaming container {} to {}", id, new_name);

        self.execute(
            Invocation::new(&self.program)
                .args(["rename", "--", id, new_name])
                .timeout(Some(self.timeouts.command)),
        )
        .await?;

        Ok(())
    }
}
