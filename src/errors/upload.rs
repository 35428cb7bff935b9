use axum::http::StatusCode;
use thiserror::Error;

use super::{AppError, ErrorSeverity, impl_into_response};

/// Validation failures for an incoming upload, raised before any job row exists.
#[derive(Error, Debug, PartialEq)]
pub enum UploadError {
    #[error("No file field in multipart request")]
    MissingFile,

    #[error("Uploaded file '{filename}' is empty")]
    EmptyFile { filename: String },

    #[error("File size {size} bytes exceeds the {limit_mb} MB limit")]
    FileTooLarge { size: u64, limit_mb: u64 },

    #[error("Request body exceeds the {limit_mb} MB upload limit")]
    BodyTooLarge { limit_mb: u64 },

    #[error("File type '{mime_type}' is not allowed")]
    UnsupportedMimeType { mime_type: String },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Malformed multipart body: {details}")]
    MalformedMultipart { details: String },
}

impl AppError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::MissingFile
            | UploadError::EmptyFile { .. }
            | UploadError::InvalidField { .. }
            | UploadError::MalformedMultipart { .. } => StatusCode::BAD_REQUEST,
            UploadError::FileTooLarge { .. } | UploadError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::UnsupportedMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    fn user_message(&self) -> String {
        match self {
            UploadError::MissingFile => "No file provided".to_string(),
            UploadError::EmptyFile { .. } => "The uploaded file is empty".to_string(),
            UploadError::FileTooLarge { limit_mb, .. } | UploadError::BodyTooLarge { limit_mb } => format!("File is too large (maximum {} MB)", limit_mb),
            UploadError::UnsupportedMimeType { mime_type } => format!("File type '{}' is not supported", mime_type),
            UploadError::InvalidField { field, .. } => format!("Invalid value for '{}'", field),
            UploadError::MalformedMultipart { .. } => "Malformed upload request".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UploadError::MissingFile => "UPLOAD_MISSING_FILE",
            UploadError::EmptyFile { .. } => "UPLOAD_EMPTY_FILE",
            UploadError::FileTooLarge { .. } | UploadError::BodyTooLarge { .. } => "UPLOAD_FILE_TOO_LARGE",
            UploadError::UnsupportedMimeType { .. } => "UPLOAD_UNSUPPORTED_TYPE",
            UploadError::InvalidField { .. } => "UPLOAD_INVALID_FIELD",
            UploadError::MalformedMultipart { .. } => "UPLOAD_MALFORMED",
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        ErrorSeverity::Minor
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            UploadError::UnsupportedMimeType { .. } => Some("Upload a PDF, image or text document".to_string()),
            UploadError::FileTooLarge { .. } | UploadError::BodyTooLarge { .. } => Some("Split or compress the document before uploading".to_string()),
            _ => None,
        }
    }
}

impl_into_response!(UploadError);
