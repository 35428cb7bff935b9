//! The upload pipeline: store, extract, classify, analyse, record.
//!
//! Every stage transition is persisted through [`JobStore`] before the stage
//! runs, so a client polling the job sees progress 10, 30, 55, 80 and 100 in
//! that order. Storage, extraction and document-row failures are hard: the
//! job is marked failed and processing stops. AI failures are soft and fall
//! back to an empty classification or empty fields.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::{self, suggestions, Classification, DocumentAnalyzer};
use crate::models::{
    needs_review, ActivityEntry, Document, ExtractedFields, ExtractedInvoice, JobStage, Locale,
    NewUploadJob, Suggestion, UploadJob, ACTION_DOCUMENT_FAILED, ACTION_DOCUMENT_PROCESSED,
    ACTION_DOCUMENT_UPLOADED,
};
use crate::services::file_service::FileService;
use crate::services::text_extraction::TextExtractor;

pub use crate::errors::pipeline::PipelineError;

const SUMMARY_FALLBACK_CHARS: usize = 280;

/// Persistence used by the pipeline. Implemented by the Postgres
/// [`Database`](crate::db::Database).
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: &UploadJob) -> anyhow::Result<()>;

    async fn update_job(&self, job: &UploadJob) -> anyhow::Result<()>;

    async fn create_document(&self, document: &Document) -> anyhow::Result<()>;

    async fn create_invoice(&self, invoice: &ExtractedInvoice) -> anyhow::Result<()>;

    async fn log_activity(&self, entry: &ActivityEntry) -> anyhow::Result<()>;
}

/// A validated upload ready to be processed.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub locale: Locale,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub job: UploadJob,
    pub document: Document,
    pub invoice: Option<ExtractedInvoice>,
    pub classification: Classification,
    pub fields: ExtractedFields,
    pub summary: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub needs_review: bool,
}

#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn JobStore>,
    files: FileService,
    extractor: TextExtractor,
    analyzer: Arc<dyn DocumentAnalyzer>,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        files: FileService,
        extractor: TextExtractor,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> Self {
        Self { store, files, extractor, analyzer }
    }

    pub async fn process(&self, request: UploadRequest) -> Result<PipelineOutcome, PipelineError> {
        let mut job = UploadJob::new(NewUploadJob {
            user_id: request.user_id,
            organization_id: request.organization_id,
            project_id: request.project_id,
            client_id: request.client_id,
            filename: request.filename.clone(),
            file_size: request.data.len() as i64,
            mime_type: request.mime_type.clone(),
        });
        self.store.create_job(&job).await?;
        self.record(
            &job,
            ACTION_DOCUMENT_UPLOADED,
            "upload_job",
            Some(job.id),
            json!({
                "filename": job.filename,
                "file_size": job.file_size,
                "mime_type": job.mime_type,
            }),
        )
        .await;
        info!("Upload job {} created for {} ({} bytes)", job.id, job.filename, job.file_size);

        self.enter(&mut job, JobStage::Upload).await?;
        let stored = match self.files.save_file(&request.filename, &request.data).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(&mut job, format!("Failed to store file: {}", e)).await),
        };

        self.enter(&mut job, JobStage::Extraction).await?;
        let text = match self.extractor.extract(&stored.path, &request.mime_type).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(&mut job, format!("Text extraction failed: {}", e)).await),
        };
        debug!("Extracted {} characters for job {}", text.chars().count(), job.id);

        self.enter(&mut job, JobStage::Classification).await?;
        let classification = match self.analyzer.classify(&text).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!("Classification failed for job {} ({}): {}", job.id, self.analyzer.name(), e);
                Classification::unknown()
            }
        };

        self.enter(&mut job, JobStage::Analysis).await?;
        let fields = match self.analyzer.extract_fields(&text, classification.document_type).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Field extraction failed for job {} ({}): {}", job.id, self.analyzer.name(), e);
                ExtractedFields::default()
            }
        };
        let summary = match self.analyzer.summarize(&text, request.locale).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summary failed for job {}: {}", job.id, e);
                analysis::summarize_text(&text, SUMMARY_FALLBACK_CHARS)
            }
        };
        let summary = Some(summary.trim().to_string()).filter(|s| !s.is_empty());

        let review = classification.document_type.is_billing() && needs_review(fields.confidence);
        let suggestions = suggestions::generate(classification.document_type, &fields, review, request.locale);

        let document = Document {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            organization_id: request.organization_id,
            project_id: request.project_id,
            client_id: request.client_id,
            job_id: Some(job.id),
            filename: stored.saved_filename,
            original_filename: request.filename,
            file_path: stored.path,
            file_size: stored.size,
            mime_type: request.mime_type,
            file_hash: Some(stored.hash),
            extracted_text: Some(text),
            document_type: classification.document_type,
            confidence: classification.confidence,
            summary: summary.clone(),
            extracted_fields: fields.to_json(),
            suggestions: serde_json::to_value(&suggestions).unwrap_or_else(|_| json!([])),
            language: request.locale,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.create_document(&document).await {
            return Err(self.fail(&mut job, format!("Failed to save document: {}", e)).await);
        }

        let invoice = if document.document_type.is_billing() {
            let invoice = ExtractedInvoice::from_fields(&document, &fields);
            if let Err(e) = self.store.create_invoice(&invoice).await {
                return Err(self.fail(&mut job, format!("Failed to save extracted invoice: {}", e)).await);
            }
            Some(invoice)
        } else {
            None
        };

        job.document_id = Some(document.id);
        self.enter(&mut job, JobStage::Completed).await?;
        self.record(
            &job,
            ACTION_DOCUMENT_PROCESSED,
            "document",
            Some(document.id),
            json!({
                "job_id": job.id,
                "document_type": document.document_type,
                "confidence": document.confidence,
                "needs_review": review,
                "analyzer": self.analyzer.name(),
            }),
        )
        .await;
        info!(
            "Upload job {} completed: {} classified as {} ({:.2})",
            job.id, document.original_filename, document.document_type, document.confidence
        );

        Ok(PipelineOutcome {
            job,
            document,
            invoice,
            classification,
            fields,
            summary,
            suggestions,
            needs_review: review,
        })
    }

    async fn enter(&self, job: &mut UploadJob, stage: JobStage) -> Result<(), PipelineError> {
        let persisted = job.clone();
        job.advance(stage)?;
        if let Err(e) = self.store.update_job(job).await {
            // A completed job cannot fail; fall back to the last stored stage
            if job.is_terminal() {
                *job = persisted;
            }
            return Err(self.fail(job, format!("Failed to persist {} stage: {}", stage, e)).await);
        }
        debug!("Job {} entered {} ({}%)", job.id, stage, job.progress);
        Ok(())
    }

    /// Mark the job failed, persist it and build the error for the caller.
    /// The stored file is left in place.
    async fn fail(&self, job: &mut UploadJob, message: String) -> PipelineError {
        error!("Upload job {} failed during {}: {}", job.id, job.stage, message);

        if let Err(e) = job.fail(message.clone()) {
            return e.into();
        }
        if let Err(e) = self.store.update_job(job).await {
            error!("Failed to persist failure of job {}: {}", job.id, e);
        }
        self.record(
            job,
            ACTION_DOCUMENT_FAILED,
            "upload_job",
            Some(job.id),
            json!({ "stage": job.stage, "error": message }),
        )
        .await;

        PipelineError::StageFailed { job_id: job.id, stage: job.stage, message }
    }

    async fn record(
        &self,
        job: &UploadJob,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) {
        let entry = ActivityEntry::new(job.user_id, job.organization_id, action, entity_type, entity_id, details);
        if let Err(e) = self.store.log_activity(&entry).await {
            warn!("Failed to record {} activity for job {}: {}", action, job.id, e);
        }
    }
}
