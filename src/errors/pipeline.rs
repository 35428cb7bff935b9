use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use super::{AppError, ErrorSeverity, impl_into_response};
use crate::models::{JobStage, JobTransitionError};

/// Hard failures of the upload pipeline. Soft failures (AI classification or
/// field extraction) never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Upload job {job_id} failed during {stage}: {message}")]
    StageFailed {
        job_id: Uuid,
        stage: JobStage,
        message: String,
    },

    #[error("Failed to persist upload job state: {message}")]
    Store { message: String },

    #[error(transparent)]
    Transition(#[from] JobTransitionError),
}

impl AppError for PipelineError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn user_message(&self) -> String {
        match self {
            PipelineError::StageFailed { stage, .. } => {
                format!("Document processing failed during the {} stage", stage)
            }
            _ => "An internal error occurred".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PipelineError::StageFailed { .. } => "PIPELINE_STAGE_FAILED",
            PipelineError::Store { .. } => "PIPELINE_STORE_ERROR",
            PipelineError::Transition(_) => "PIPELINE_INVALID_TRANSITION",
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            PipelineError::StageFailed { .. } => ErrorSeverity::Important,
            _ => ErrorSeverity::Critical,
        }
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            PipelineError::StageFailed { job_id, .. } => {
                Some(format!("Check job {} for details or upload the file again", job_id))
            }
            _ => None,
        }
    }
}

impl_into_response!(PipelineError);

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Store { message: err.to_string() }
    }
}
