//! Container Inventory
//!
//! Lists every container the runtime knows about. The runtime prints one
//! JSON object per line; each line is decoded on its own so that a single
//! unexpected line does not hide the rest of the listing.

use dockhand_core::domain::{ContainerListing, ContainerRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::collaborator::ContainerRuntime;
use crate::process::ToolError;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Error getting container list: {0}")]
    Query(#[from] ToolError),
}

impl InventoryError {
    pub fn tool_error(&self) -> &ToolError {
        match self {
            InventoryError::Query(e) => e,
        }
    }
}

/// Queries the runtime for all containers, running or not
pub async fn list_containers(
    runtime: &dyn ContainerRuntime,
) -> Result<ContainerListing, InventoryError> {
    let output = runtime.list_containers().await?;
    let listing = decode_listing(&output);

    debug!(
        "Listed {} container(s), {} line(s) skipped",
        listing.records.len(),
        listing.skipped
    );

    Ok(listing)
}

/// Decodes line-delimited runtime output
///
/// Blank lines are ignored. Lines that are not JSON objects are skipped and
/// counted: the runtime's own format is trusted, so a bad line points at a
/// runtime version this server does not understand.
pub fn decode_listing(output: &str) -> ContainerListing {
    let mut listing = ContainerListing::default();

    for (index, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ContainerRecord::from_line(line) {
            Some(record) => listing.records.push(record),
            None => {
                warn!("Skipping undecodable container line {}: {}", index + 1, line);
                listing.skipped += 1;
            }
        }
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fakes::{FakeTools, tool_failure};

    fn lines(k: usize) -> Vec<String> {
        (0..k)
            .map(|i| format!(r#"{{"ID":"c{i}","Image":"repo_image_{i}","Status":"Up"}}"#))
            .collect()
    }

    #[tokio::test]
    async fn test_well_formed_lines_round_trip_in_order() {
        let tools = FakeTools::new();
        tools.set_listing(&(lines(5).join("\n") + "\n"));

        let listing = list_containers(&*tools).await.unwrap();

        assert_eq!(listing.skipped, 0);
        let ids: Vec<_> = listing.records.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped_and_counted() {
        let tools = FakeTools::new();
        let mut output = lines(3);
        output.insert(1, "Error: template: unexpected \"}\"".to_string());
        tools.set_listing(&output.join("\n"));

        let listing = list_containers(&*tools).await.unwrap();

        assert_eq!(listing.records.len(), 3);
        assert_eq!(listing.skipped, 1);
        assert_eq!(listing.records[1].id(), Some("c1"));
    }

    #[test]
    fn test_empty_output_is_empty_listing() {
        let listing = decode_listing("");
        assert!(listing.records.is_empty());
        assert_eq!(listing.skipped, 0);

        let listing = decode_listing("\n\n  \n");
        assert!(listing.records.is_empty());
        assert_eq!(listing.skipped, 0);
    }

    #[test]
    fn test_non_object_json_is_skipped() {
        let listing = decode_listing("[]\n\"text\"\n{\"ID\":\"x\"}\n");
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.skipped, 2);
    }

    #[tokio::test]
    async fn test_runtime_failure_is_reported() {
        let tools = FakeTools::new();
        tools.fail(
            "ps",
            tool_failure("docker ps", "Cannot connect to the Docker daemon"),
        );

        let err = list_containers(&*tools).await.unwrap_err();
        assert!(err.to_string().starts_with("Error getting container list"));
        assert!(err.to_string().contains("Cannot connect to the Docker daemon"));
    }
}
