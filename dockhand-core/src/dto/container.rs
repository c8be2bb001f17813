//! Container request DTOs

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Body of `POST /deleteContainer` and `POST /stopContainer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRequest {
    /// Container ID or name as known to the runtime
    pub container_id: String,
}

impl ContainerRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_reference("container_id", &self.container_id)
    }
}

/// Body of `POST /editContainer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameContainerRequest {
    pub container_id: String,
    pub new_container_name: String,
}

impl RenameContainerRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_reference("container_id", &self.container_id)?;
        validate_reference("new_container_name", &self.new_container_name)?;

        // Same rule the runtimes apply to `--name`
        let mut chars = self.new_container_name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if !valid {
            return Err(ValidationError::InvalidContainerName(
                self.new_container_name.clone(),
            ));
        }

        Ok(())
    }
}

/// Checks a value that is passed to the runtime as a single positional argument
fn validate_reference(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }

    // A single argv entry, so no splitting can happen, but a stray space
    // is always a client mistake.
    if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::Whitespace { field });
    }

    // The runtime would read it as an option, e.g. `stop --help` exits 0
    if value.starts_with('-') {
        return Err(ValidationError::LeadingDash { field });
    }

    Ok(())
}
