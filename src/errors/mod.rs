use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How loudly an error should be logged when it is turned into a response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Breaks core functionality for the caller
    Critical,
    /// Affects one feature or one request
    Important,
    /// Client mistakes such as bad input
    Minor,
    /// Expected outcomes of normal use, e.g. hitting a plan limit
    Expected,
}

/// Common trait for all custom error types in the application
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get the error code for frontend handling
    fn error_code(&self) -> &'static str;

    fn error_severity(&self) -> ErrorSeverity;

    /// Get optional suggested action for the user
    fn suggested_action(&self) -> Option<String> {
        None
    }
}

/// Log an error at the level its severity asks for.
pub fn log_app_error<E: AppError + ?Sized>(error: &E) {
    match error.error_severity() {
        ErrorSeverity::Critical => tracing::error!(code = error.error_code(), "{}", error),
        ErrorSeverity::Important => tracing::warn!(code = error.error_code(), "{}", error),
        ErrorSeverity::Minor => tracing::info!(code = error.error_code(), "{}", error),
        ErrorSeverity::Expected => tracing::debug!(code = error.error_code(), "{}", error),
    }
}

/// Macro to implement IntoResponse for all AppError types
/// This provides consistent HTTP response formatting
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                use crate::errors::AppError;
                use axum::response::Json;
                use serde_json::json;

                crate::errors::log_app_error(&self);

                let status = self.status_code();
                let mut body = json!({
                    "error": self.user_message(),
                    "code": self.error_code(),
                    "status": status.as_u16()
                });
                if let Some(action) = self.suggested_action() {
                    body["suggested_action"] = json!(action);
                }

                (status, Json(body)).into_response()
            }
        }
    };
}

// Re-export the macro for use in other modules
pub(crate) use impl_into_response;

/// Generic API error for cases where specific error types don't apply
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found")]
    NotFound,

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl AppError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message } => message.clone(),
            ApiError::NotFound => "Resource not found".to_string(),
            ApiError::Conflict { message } => message.clone(),
            ApiError::Unauthorized => "Authentication required".to_string(),
            ApiError::Forbidden { message } => message.clone(),
            ApiError::InternalServerError { .. } => "An internal error occurred".to_string(),
            ApiError::ServiceUnavailable { message } => message.clone(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            ApiError::InternalServerError { .. } => ErrorSeverity::Critical,
            ApiError::ServiceUnavailable { .. } => ErrorSeverity::Important,
            ApiError::Unauthorized | ApiError::Forbidden { .. } => ErrorSeverity::Important,
            _ => ErrorSeverity::Minor,
        }
    }
}

impl_into_response!(ApiError);

/// Utility functions for common error creation patterns
impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal_server_error<S: Into<String>>(message: S) -> Self {
        Self::InternalServerError { message: message.into() }
    }

    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable { message: message.into() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal_server_error(err.to_string())
    }
}

// Submodules for entity-specific errors
pub mod pipeline;
pub mod upload;
pub mod usage;
pub mod user;
