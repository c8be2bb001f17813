//! Deploy request DTOs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Body of `POST /cloneRepo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    /// Repository URL handed to the version-control tool
    pub repo_url: String,

    /// Port published on the host and inside the container
    pub container_port: ContainerPort,
}

impl DeployRequest {
    /// Checks the fields the collaborator tools cannot cope with
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.repo_url.trim();

        if url.is_empty() {
            return Err(ValidationError::Empty { field: "repo_url" });
        }

        if url.chars().any(char::is_whitespace) {
            return Err(ValidationError::Whitespace { field: "repo_url" });
        }

        Ok(())
    }
}

/// A TCP port in `1..=65535`
///
/// The web front end sends ports as strings, other clients as numbers;
/// both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPort", into = "u16")]
pub struct ContainerPort(u16);

impl ContainerPort {
    pub fn new(port: u16) -> Result<Self, ValidationError> {
        if port == 0 {
            return Err(ValidationError::InvalidPort(port.to_string()));
        }
        Ok(Self(port))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ContainerPort> for u16 {
    fn from(port: ContainerPort) -> Self {
        port.0
    }
}

impl std::str::FromStr for ContainerPort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .trim()
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPort(s.to_string()))?;
        Self::new(port)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPort {
    Number(u64),
    Text(String),
}

impl TryFrom<RawPort> for ContainerPort {
    type Error = ValidationError;

    fn try_from(raw: RawPort) -> Result<Self, Self::Error> {
        match raw {
            RawPort::Number(n) => u16::try_from(n)
                .map_err(|_| ValidationError::InvalidPort(n.to_string()))
                .and_then(Self::new),
            RawPort::Text(s) => s.parse(),
        }
    }
}
