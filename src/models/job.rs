use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum JobStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
pub enum JobStage {
    #[serde(rename = "upload")]
    Upload,
    #[serde(rename = "extraction")]
    Extraction,
    #[serde(rename = "classification")]
    Classification,
    #[serde(rename = "analysis")]
    Analysis,
    #[serde(rename = "completed")]
    Completed,
}

impl JobStage {
    pub const SEQUENCE: [JobStage; 5] = [
        JobStage::Upload,
        JobStage::Extraction,
        JobStage::Classification,
        JobStage::Analysis,
        JobStage::Completed,
    ];

    /// Progress percentage recorded when a job enters this stage.
    pub fn progress(&self) -> i32 {
        match self {
            JobStage::Upload => 10,
            JobStage::Extraction => 30,
            JobStage::Classification => 55,
            JobStage::Analysis => 80,
            JobStage::Completed => 100,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", value)),
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Upload => write!(f, "upload"),
            JobStage::Extraction => write!(f, "extraction"),
            JobStage::Classification => write!(f, "classification"),
            JobStage::Analysis => write!(f, "analysis"),
            JobStage::Completed => write!(f, "completed"),
        }
    }
}

impl TryFrom<String> for JobStage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "upload" => Ok(JobStage::Upload),
            "extraction" => Ok(JobStage::Extraction),
            "classification" => Ok(JobStage::Classification),
            "analysis" => Ok(JobStage::Analysis),
            "completed" => Ok(JobStage::Completed),
            _ => Err(format!("Invalid job stage: {}", value)),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum JobTransitionError {
    #[error("Job {id} is already {status} and cannot change")]
    AlreadyTerminal { id: Uuid, status: JobStatus },

    #[error("Job {id} cannot move from stage {from} to stage {to}")]
    OutOfOrder { id: Uuid, from: JobStage, to: JobStage },
}

/// Ownership and file metadata captured when an upload is accepted.
#[derive(Debug, Clone)]
pub struct NewUploadJob {
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UploadJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    #[sqlx(try_from = "String")]
    pub stage: JobStage,
    pub progress: i32,
    pub error_message: Option<String>,
    pub document_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadJob {
    pub fn new(request: NewUploadJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            organization_id: request.organization_id,
            project_id: request.project_id,
            client_id: request.client_id,
            filename: request.filename,
            file_size: request.file_size,
            mime_type: request.mime_type,
            status: JobStatus::Pending,
            stage: JobStage::Upload,
            progress: 0,
            error_message: None,
            document_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    /// Move the job forward to `stage`.
    ///
    /// Stages only move forward. The one exception is a pending job entering
    /// `upload`, which is where every job starts.
    pub fn advance(&mut self, stage: JobStage) -> Result<(), JobTransitionError> {
        if self.is_terminal() {
            return Err(JobTransitionError::AlreadyTerminal { id: self.id, status: self.status });
        }

        let entering_first_stage = self.status == JobStatus::Pending && stage == JobStage::Upload;
        if !entering_first_stage && stage <= self.stage {
            return Err(JobTransitionError::OutOfOrder { id: self.id, from: self.stage, to: stage });
        }

        let now = Utc::now();
        self.stage = stage;
        self.progress = self.progress.max(stage.progress());
        self.updated_at = now;
        if stage == JobStage::Completed {
            self.status = JobStatus::Completed;
            self.completed_at = Some(now);
        } else {
            self.status = JobStatus::Processing;
        }
        Ok(())
    }

    /// Mark the job failed. Stage and progress keep the values they had when
    /// the failure happened.
    pub fn fail<S: Into<String>>(&mut self, message: S) -> Result<(), JobTransitionError> {
        if self.is_terminal() {
            return Err(JobTransitionError::AlreadyTerminal { id: self.id, status: self.status });
        }
        let now = Utc::now();
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> UploadJob {
        UploadJob::new(NewUploadJob {
            user_id: Uuid::new_v4(),
            organization_id: None,
            project_id: None,
            client_id: None,
            filename: "facture-0042.pdf".to_string(),
            file_size: 2048,
            mime_type: "application/pdf".to_string(),
        })
    }

    #[test]
    fn test_new_job_is_pending_at_zero() {
        let job = new_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.stage, JobStage::Upload);
        assert_eq!(job.progress, 0);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_progress_strictly_increases_through_sequence() {
        let mut job = new_job();
        let mut last = job.progress;
        for stage in JobStage::SEQUENCE {
            job.advance(stage).unwrap();
            assert!(job.progress > last, "progress did not increase at {}", stage);
            last = job.progress;
        }
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_cannot_skip_backwards_or_repeat() {
        let mut job = new_job();
        job.advance(JobStage::Upload).unwrap();
        job.advance(JobStage::Extraction).unwrap();

        let err = job.advance(JobStage::Upload).unwrap_err();
        assert!(matches!(err, JobTransitionError::OutOfOrder { .. }));
        let err = job.advance(JobStage::Extraction).unwrap_err();
        assert!(matches!(err, JobTransitionError::OutOfOrder { .. }));
        assert_eq!(job.progress, JobStage::Extraction.progress());
    }

    #[test]
    fn test_failure_freezes_progress() {
        let mut job = new_job();
        job.advance(JobStage::Upload).unwrap();
        job.advance(JobStage::Extraction).unwrap();
        job.fail("pdftotext exited with status 1").unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stage, JobStage::Extraction);
        assert_eq!(job.progress, 30);
        assert_eq!(job.error_message.as_deref(), Some("pdftotext exited with status 1"));

        assert!(job.advance(JobStage::Classification).is_err());
        assert!(job.fail("again").is_err());
        assert_eq!(job.progress, 30);
    }

    #[test]
    fn test_completed_job_rejects_failure() {
        let mut job = new_job();
        for stage in JobStage::SEQUENCE {
            job.advance(stage).unwrap();
        }
        let err = job.fail("late").unwrap_err();
        assert_eq!(err, JobTransitionError::AlreadyTerminal { id: job.id, status: JobStatus::Completed });
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [JobStatus::Pending, JobStatus::Processing, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(JobStatus::try_from(status.to_string()).unwrap(), status);
        }
        assert!(JobStage::try_from("ocr".to_string()).is_err());
    }
}
