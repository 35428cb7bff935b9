use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;
use serde_json;

use super::{
    document::{Document, DocumentType},
    ExtractedFields, ExtractedInvoice, JobStage, JobStatus, Locale, Suggestion, UploadJob,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    /// Unique identifier for the document
    pub id: Uuid,
    /// Stored filename
    pub filename: String,
    /// Original filename when uploaded
    pub original_filename: String,
    /// File size in bytes
    pub file_size: i64,
    /// MIME type of the file
    pub mime_type: String,
    /// Type assigned by classification
    pub document_type: DocumentType,
    /// Classification confidence (0-1)
    pub confidence: f64,
    /// Short summary of the document
    pub summary: Option<String>,
    /// Structured fields extracted from the document text
    #[schema(value_type = Object)]
    pub extracted_fields: serde_json::Value,
    /// Follow-up actions suggested after processing
    #[schema(value_type = Object)]
    pub suggestions: serde_json::Value,
    /// Language used for generated text
    pub language: Locale,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// Upload job that produced this document
    pub job_id: Option<Uuid>,
    /// When the document was created
    pub created_at: DateTime<Utc>,
    /// Whether any text was extracted
    pub has_text: bool,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        let has_text = doc
            .extracted_text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        Self {
            id: doc.id,
            filename: doc.filename,
            original_filename: doc.original_filename,
            file_size: doc.file_size,
            mime_type: doc.mime_type,
            document_type: doc.document_type,
            confidence: doc.confidence,
            summary: doc.summary,
            extracted_fields: doc.extracted_fields,
            suggestions: doc.suggestions,
            language: doc.language,
            project_id: doc.project_id,
            client_id: doc.client_id,
            job_id: doc.job_id,
            created_at: doc.created_at,
            has_text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    /// Present for invoices and receipts
    pub invoice: Option<ExtractedInvoice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedDocumentsResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// Returned by the upload route once the pipeline has finished.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub status: JobStatus,
    pub document_type: DocumentType,
    pub confidence: f64,
    pub needs_review: bool,
    pub summary: Option<String>,
    pub fields: ExtractedFields,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub filename: String,
    pub status: JobStatus,
    pub stage: JobStage,
    pub progress: i32,
    pub error_message: Option<String>,
    pub document_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<UploadJob> for JobStatusResponse {
    fn from(job: UploadJob) -> Self {
        Self {
            job_id: job.id,
            filename: job.filename,
            status: job.status,
            stage: job.stage,
            progress: job.progress,
            error_message: job.error_message,
            document_id: job.document_id,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
        }
    }
}
