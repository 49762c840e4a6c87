//! Error handling for the B2B marketplace
//!
//! Validation errors carry a field name and reach the caller as-is. Failures
//! from the store or the auth provider are logged and turned into generic
//! messages, except where the provider's own message is meant for the user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::FieldError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Workflow errors
    #[error("Could not start conversation: {0}")]
    ConversationCreate(String),

    #[error("Could not send message: {0}")]
    MessageSend(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    // External service errors
    /// Message from the auth provider, shown to the user unchanged
    #[error("{0}")]
    AuthProvider(String),

    #[error("Auth provider unavailable: {0}")]
    AuthProviderUnavailable(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Data access error: {0}")]
    DataAccess(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::validation(err.field, err.message)
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Reports the alphabetically first failing field
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                AppError::validation(*field, message)
            }
            None => AppError::validation("form", "Invalid input"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::ConversationCreate(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONVERSATION_CREATE_FAILED",
                    "Failed to start a conversation. Please try again.",
                ),
            ),
            AppError::MessageSend(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("MESSAGE_SEND_FAILED", "Failed to send message. Please try again."),
            ),
            AppError::Registration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "REGISTRATION_FAILED",
                    "Could not complete registration. Please try again.",
                ),
            ),
            AppError::AuthProvider(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("AUTH_ERROR", msg.clone()),
            ),
            AppError::AuthProviderUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "AUTH_PROVIDER_UNAVAILABLE",
                    "Authentication service is temporarily unavailable",
                ),
            ),
            AppError::DatabaseError(_) | AppError::DataAccess(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "Something went wrong. Please try again."),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_field_error_maps_to_validation() {
        let err: AppError = FieldError::new("message", "Message cannot be empty").into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "message");
                assert_eq!(message, "Message cannot be empty");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validation_errors_pick_first_field() {
        let input = shared::SignUpInput {
            email: "nope".to_string(),
            password: "short".to_string(),
            full_name: "Meera".to_string(),
        };
        let err: AppError = input.validate().unwrap_err().into();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "email"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("x", "y").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuthProvider("User already registered".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DataAccess("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::NotFound("Conversation".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("Authentication required".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
