//! Validation errors for request DTOs and identifiers

use thiserror::Error;

/// Raised when externally supplied data does not satisfy the
/// constraints the collaborator tools need.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} must not contain whitespace")]
    Whitespace { field: &'static str },

    #[error("{field} must not start with '-'")]
    LeadingDash { field: &'static str },

    #[error("invalid container name '{0}': must start with a letter or digit and contain only letters, digits, '_', '.' and '-'")]
    InvalidContainerName(String),

    #[error("invalid port '{0}': expected an integer between 1 and 65535")]
    InvalidPort(String),

    #[error("invalid deployment identifier '{0}': only lowercase letters, digits and '-' are allowed")]
    InvalidIdentifier(String),
}
