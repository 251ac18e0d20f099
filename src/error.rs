//! Error handling module
//!
//! `GovernanceError` is the taxonomy raised by the policy core; `AppError`
//! wraps it for the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors raised by the governance core.
///
/// Constraint violations are never raised: the enforcer corrects them and
/// reports what it did in the result record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    #[error("Invalid parameter '{parameter}' for {transform}: {reason}")]
    InvalidParameter {
        transform: String,
        parameter: String,
        reason: String,
    },

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid domain definition: {0}")]
    DomainDefinition(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GovernanceError {
    pub fn invalid_parameter(
        transform: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            transform: transform.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GovernanceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for GovernanceError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            AppError::Governance(e) => {
                let (status, code) = match e {
                    GovernanceError::UnknownTransform(_) => {
                        (StatusCode::BAD_REQUEST, "UNKNOWN_TRANSFORM")
                    }
                    GovernanceError::InvalidParameter { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_PARAMETER")
                    }
                    GovernanceError::DomainNotFound(_) => (StatusCode::NOT_FOUND, "DOMAIN_NOT_FOUND"),
                    GovernanceError::InvalidSchedule(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_SCHEDULE")
                    }
                    GovernanceError::DomainDefinition(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_DOMAIN")
                    }
                    GovernanceError::Serialization(_) => {
                        (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR")
                    }
                };
                (status, code, e.to_string(), None)
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governance_error_status_codes() {
        let unknown = AppError::from(GovernanceError::UnknownTransform("Warp".into()));
        assert_eq!(unknown.parts().0, StatusCode::BAD_REQUEST);
        assert_eq!(unknown.parts().1, "UNKNOWN_TRANSFORM");

        let domain = AppError::from(GovernanceError::DomainNotFound("xray".into()));
        assert_eq!(domain.parts().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = GovernanceError::invalid_parameter("Rotate", "limit", "expected a number");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'limit' for Rotate: expected a number"
        );
    }

    #[test]
    fn test_internal_error_hides_details_in_message() {
        let (status, code, message, details) = AppError::Internal("boom".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert_eq!(message, "An internal error occurred");
        assert_eq!(details.as_deref(), Some("boom"));
    }
}
