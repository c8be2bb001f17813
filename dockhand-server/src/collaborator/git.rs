//! Git command-line fetch tool

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::VersionControl;
use crate::process::{CommandRunner, Invocation, ToolError};

/// Clones repositories with `git clone <url> <dest>`
pub struct GitCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    timeout: Option<Duration>,
}

impl GitCli {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError> {
        info!("Cloning {} into {}", url, destination.display());

        // `--` keeps a URL starting with '-' from being read as an option
        let invocation = Invocation::new(&self.program)
            .args(["clone", "--", url])
            .arg(destination.display().to_string())
            .timeout(self.timeout);

        self.runner
            .run(&invocation)
            .await?
            .into_result(&invocation)?;

        Ok(())
    }
}
