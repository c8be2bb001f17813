//! Collaborator interfaces
//!
//! Dockhand does not fetch, build or run anything itself. It drives three
//! external tools, each modelled as a trait so the pipeline and the
//! container services can be exercised against fakes:
//! - [`VersionControl`]: materializes a remote repository locally
//! - [`ImageBuilder`]: turns a directory with a build recipe into an image
//! - [`ContainerRuntime`]: starts, lists, stops, renames and removes containers
//!
//! The production implementations shell out through a
//! [`CommandRunner`](crate::process::CommandRunner).

mod container_cli;
mod git;

pub use container_cli::{ContainerCli, ContainerTimeouts};
pub use git::GitCli;

use async_trait::async_trait;
use dockhand_core::dto::deploy::ContainerPort;
use std::path::Path;
use tracing::{info, warn};

use crate::process::{CommandRunner, Invocation, ToolError};

/// Fetches remote repositories
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clones `url` into `destination`, which must not exist yet
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError>;
}

/// Builds container images
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Builds the recipe found in `context` and tags the result as `image`
    async fn build_image(&self, image: &str, context: &Path) -> Result<(), ToolError>;

    /// Deletes an image from the local image store
    async fn remove_image(&self, image: &str) -> Result<(), ToolError>;
}

/// Manages containers
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Starts a detached container from `image`, publishing `port` on the
    /// host to the same port in the container
    ///
    /// # Returns
    /// The ID printed by the runtime
    async fn run_container(&self, image: &str, port: ContainerPort) -> Result<String, ToolError>;

    /// Lists every container, one JSON object per line
    async fn list_containers(&self) -> Result<String, ToolError>;

    async fn stop_container(&self, id: &str) -> Result<(), ToolError>;

    async fn remove_container(&self, id: &str) -> Result<(), ToolError>;

    /// Gives a container a new name; the container keeps its ID
    async fn rename_container(&self, id: &str, new_name: &str) -> Result<(), ToolError>;
}

/// Checks that `program` is installed by asking for its version
///
/// # Returns
/// The version string the tool printed
pub async fn check_tool_available(
    runner: &dyn CommandRunner,
    program: &str,
) -> Result<String, ToolError> {
    let invocation = Invocation::new(program)
        .arg("--version")
        .capture_stdout()
        .timeout(Some(std::time::Duration::from_secs(10)));

    match runner
        .run(&invocation)
        .await
        .and_then(|output| output.into_result(&invocation))
    {
        Ok(output) => {
            let version = output.stdout.trim().to_string();
            info!("{} is available: {}", program, version);
            Ok(version)
        }
        Err(e) => {
            warn!("{} is not usable: {}", program, e);
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A [`CommandRunner`] that records invocations and replays scripted output

    use super::*;
    use crate::process::ProcessOutput;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingRunner {
        pub invocations: Mutex<Vec<Invocation>>,
        responses: Mutex<VecDeque<Result<ProcessOutput, ToolError>>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues the result for the next invocation. Unscripted
        /// invocations succeed with empty output.
        pub fn respond(&self, response: Result<ProcessOutput, ToolError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn recorded(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn argv(&self) -> Vec<Vec<String>> {
            self.recorded()
                .into_iter()
                .map(|i| std::iter::once(i.program).chain(i.args).collect())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolError> {
            self.invocations.lock().unwrap().push(invocation.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProcessOutput::succeeded("")))
        }
    }

    #[tokio::test]
    async fn test_check_tool_available() {
        let runner = RecordingRunner::new();
        runner.respond(Ok(ProcessOutput::succeeded("git version 2.45.0\n")));

        let version = check_tool_available(&runner, "git").await.unwrap();
        assert_eq!(version, "git version 2.45.0");
        assert_eq!(runner.argv(), vec![vec!["git", "--version"]]);
    }

    #[tokio::test]
    async fn test_check_tool_unavailable() {
        let runner = RecordingRunner::new();
        runner.respond(Ok(ProcessOutput::failed(127, "command not found")));

        assert!(check_tool_available(&runner, "podman").await.is_err());
    }
}
