//! API Error Handling
//!
//! Every failure becomes a plain-text response whose body is the error's
//! message, including the collaborator's diagnostic output.

use axum::{
    body::Bytes,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use dockhand_core::ValidationError;
use serde::de::DeserializeOwned;

use crate::process::ToolError;
use crate::service::DeployError;
use crate::service::inventory::InventoryError;
use crate::service::teardown::TeardownError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// The body is not valid JSON for the endpoint, or a field is unusable
    RequestDecode(String),

    /// The path exists but only accepts the given method
    MethodNotAllowed(Method),

    Deploy(DeployError),
    Inventory(InventoryError),
    Teardown(TeardownError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RequestDecode(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Deploy(e) => tool_status(e.tool_error()),
            ApiError::Inventory(e) => tool_status(e.tool_error()),
            ApiError::Teardown(e) => tool_status(e.tool_error()),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::RequestDecode(msg) => msg.clone(),
            ApiError::MethodNotAllowed(method) => format!("Only {} requests are allowed", method),
            ApiError::Deploy(e) => e.to_string(),
            ApiError::Inventory(e) => e.to_string(),
            ApiError::Teardown(e) => e.to_string(),
        }
    }
}

/// A tool that never answered is a gateway timeout, anything else is ours
fn tool_status(error: &ToolError) -> StatusCode {
    if error.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, message);
        }

        let mut response = (status, message).into_response();

        if let ApiError::MethodNotAllowed(method) = &self {
            if let Ok(allow) = HeaderValue::from_str(method.as_str()) {
                response.headers_mut().insert(header::ALLOW, allow);
            }
        }

        response
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        ApiError::Deploy(err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

impl From<TeardownError> for ApiError {
    fn from(err: TeardownError) -> Self {
        ApiError::Teardown(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::RequestDecode(format!("Invalid request: {}", err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Decodes a JSON request body
///
/// The `Content-Type` header is not checked: the web front end and most
/// curl invocations do not set it.
pub fn decode_json<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::RequestDecode(format!("Error parsing JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fakes::tool_failure;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::RequestDecode("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MethodNotAllowed(Method::POST).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Deploy(DeployError::Build(tool_failure("docker build", "boom"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_timeouts_are_gateway_timeouts() {
        let err = ApiError::Deploy(DeployError::Fetch(ToolError::TimedOut {
            command: "git clone u d".to_string(),
            timeout: Duration::from_secs(300),
        }));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.message().contains("timed out after 300s"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = ApiError::MethodNotAllowed(Method::GET).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
    }

    #[test]
    fn test_decode_json_reports_bad_body() {
        let body = Bytes::from_static(b"{not json");
        let result: ApiResult<serde_json::Value> = decode_json(&body);
        assert!(matches!(
            result,
            Err(ApiError::RequestDecode(msg)) if msg.starts_with("Error parsing JSON body")
        ));
    }
}
