//! Deployment domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier of one pipeline run
///
/// Namespaces the cloned repository directory and the built image name, so it
/// only ever contains characters valid in both a path segment and an image
/// reference: lowercase ASCII letters, digits and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeploymentId(String);

impl DeploymentId {
    /// Creates an identifier, rejecting characters that would be unsafe in a
    /// path or an image name
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if !valid {
            return Err(ValidationError::InvalidIdentifier(value));
        }

        Ok(Self(value))
    }

    /// Renders a UUID in its 32 hex character form
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.simple().to_string())
    }

    /// Renders a counter value as a decimal identifier
    pub fn from_sequence(value: u64) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeploymentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeploymentId> for String {
    fn from(id: DeploymentId) -> Self {
        id.0
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Build,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Build => write!(f, "build"),
            Stage::Run => write!(f, "run"),
        }
    }
}

/// A completed deployment: the repository was cloned, built and started
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,

    /// Repository URL the deployment was created from
    pub repo_url: String,

    /// Where the working tree was cloned to
    pub repository_path: String,

    /// Image tag produced by the build stage
    pub image: String,

    /// Container ID printed by the runtime
    pub container_id: String,

    /// Host port published to the same port inside the container
    pub port: u16,

    pub created_at: DateTime<Utc>,
}
