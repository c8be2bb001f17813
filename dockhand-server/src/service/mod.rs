//! Service Module
//!
//! Business logic for Dockhand. Services sequence collaborator calls and
//! attribute failures; they never talk to processes directly.

pub mod inventory;
pub mod pipeline;
pub mod teardown;

// Re-export for convenience
pub use inventory as inventory_service;
pub use pipeline::{DeployError, DeploymentPipeline, FailurePolicy};
pub use teardown as teardown_service;

#[cfg(test)]
pub(crate) mod fakes {
    //! Scripted collaborators that record every call into a shared trace

    use async_trait::async_trait;
    use dockhand_core::dto::deploy::ContainerPort;
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::collaborator::{ContainerRuntime, ImageBuilder, VersionControl};
    use crate::process::ToolError;

    pub fn tool_failure(command: &str, diagnostic: &str) -> ToolError {
        ToolError::Failed {
            command: command.to_string(),
            status: "exit code 1".to_string(),
            diagnostic: diagnostic.to_string(),
        }
    }

    /// Implements every collaborator trait. Operations named in `failures`
    /// fail once per queued entry.
    #[derive(Default)]
    pub struct FakeTools {
        pub trace: Mutex<Vec<String>>,
        failures: Mutex<HashMap<&'static str, VecDeque<ToolError>>>,
        pub listing: Mutex<String>,
        pub create_clone_dir: bool,
    }

    impl FakeTools {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Clones create the destination directory like git would
        pub fn cloning_to_disk() -> Arc<Self> {
            Arc::new(Self {
                create_clone_dir: true,
                ..Self::default()
            })
        }

        pub fn fail(&self, operation: &'static str, error: ToolError) {
            self.failures
                .lock()
                .unwrap()
                .entry(operation)
                .or_default()
                .push_back(error);
        }

        pub fn set_listing(&self, listing: &str) {
            *self.listing.lock().unwrap() = listing.to_string();
        }

        pub fn calls(&self) -> Vec<String> {
            self.trace.lock().unwrap().clone()
        }

        pub fn count(&self, operation: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.split(' ').next() == Some(operation))
                .count()
        }

        fn record(&self, operation: &'static str, detail: String) -> Result<(), ToolError> {
            self.trace
                .lock()
                .unwrap()
                .push(format!("{} {}", operation, detail));

            match self
                .failures
                .lock()
                .unwrap()
                .get_mut(operation)
                .and_then(VecDeque::pop_front)
            {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl VersionControl for FakeTools {
        async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError> {
            self.record("clone", format!("{} {}", url, destination.display()))?;
            if self.create_clone_dir {
                std::fs::create_dir_all(destination).unwrap();
                std::fs::write(destination.join("Dockerfile"), "FROM scratch\n").unwrap();
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ImageBuilder for FakeTools {
        async fn build_image(&self, image: &str, context: &Path) -> Result<(), ToolError> {
            self.record("build", format!("{} {}", image, context.display()))
        }

        async fn remove_image(&self, image: &str) -> Result<(), ToolError> {
            self.record("rmi", image.to_string())
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeTools {
        async fn run_container(
            &self,
            image: &str,
            port: ContainerPort,
        ) -> Result<String, ToolError> {
            self.record("run", format!("{} {}", image, port))?;
            Ok(format!("container-of-{}", image))
        }

        async fn list_containers(&self) -> Result<String, ToolError> {
            self.record("ps", String::new())?;
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn stop_container(&self, id: &str) -> Result<(), ToolError> {
            self.record("stop", id.to_string())
        }

        async fn remove_container(&self, id: &str) -> Result<(), ToolError> {
            self.record("rm", id.to_string())
        }

        async fn rename_container(&self, id: &str, new_name: &str) -> Result<(), ToolError> {
            self.record("rename", format!("{} {}", id, new_name))
        }
    }
}
