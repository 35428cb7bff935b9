use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::{upload::UploadError, usage::UsageError, ApiError},
    mime_detection::{detect_mime_type, validate_upload},
    models::{JobStatusResponse, Locale, UploadResponse, UsageResource, User},
    pipeline::{PipelineError, UploadPipeline, UploadRequest},
    services::{
        file_service::FileService,
        notifications::DocumentEvent,
        text_extraction::TextExtractor,
    },
    AppState,
};

use super::types::JobStatusQuery;

/// A remote analyzer is called once each to classify, extract and summarize.
pub const AI_REQUESTS_PER_UPLOAD: i64 = 3;

struct UploadForm {
    filename: String,
    declared_type: Option<String>,
    data: Vec<u8>,
    project_id: Option<Uuid>,
    client_id: Option<Uuid>,
    locale: Option<Locale>,
}

#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "documents",
    security(
        ("bearer_auth" = [])
    ),
    request_body(content = super::types::UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document processed", body = UploadResponse),
        (status = 400, description = "Missing file or invalid field"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 402, description = "Monthly plan limit reached"),
        (status = 403, description = "Subscription is not active"),
        (status = 413, description = "File exceeds the size limit"),
        (status = 415, description = "File type not allowed"),
        (status = 500, description = "Processing failed; the job is marked failed")
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, Response> {
    let user = auth_user.user;
    let form = read_upload_form(multipart, state.config.max_file_size_mb).await.map_err(IntoResponse::into_response)?;

    let detection = detect_mime_type(&form.data, &form.filename, form.declared_type.as_deref());
    validate_upload(&form.filename, form.data.len() as u64, &detection.mime_type, &state.config)
        .map_err(IntoResponse::into_response)?;

    reserve_quota(&state, &user, form.data.len() as i64)
        .await
        .map_err(IntoResponse::into_response)?;

    let locale = form
        .locale
        .or_else(|| {
            headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .map(Locale::from_accept_language)
        })
        .unwrap_or(user.preferred_locale);

    info!("Uploading document: {} ({} bytes, {})", form.filename, form.data.len(), detection.mime_type);

    let pipeline = UploadPipeline::new(
        Arc::new(state.db.clone()),
        FileService::new(state.config.upload_path.clone()),
        TextExtractor::new(),
        state.analyzer.clone(),
    );
    let filename = form.filename.clone();
    let result = pipeline
        .process(UploadRequest {
            user_id: user.id,
            organization_id: user.organization_id,
            project_id: form.project_id,
            client_id: form.client_id,
            filename: form.filename,
            mime_type: detection.mime_type,
            data: form.data,
            locale,
        })
        .await;

    match result {
        Ok(outcome) => {
            if let Some(notifier) = &state.notifier {
                notifier.notify_in_background(
                    user.email.clone(),
                    locale,
                    DocumentEvent::Processed {
                        filename,
                        document_type: outcome.document.document_type,
                        needs_review: outcome.needs_review,
                    },
                );
            }

            Ok(Json(UploadResponse {
                job_id: outcome.job.id,
                document_id: outcome.document.id,
                status: outcome.job.status,
                document_type: outcome.document.document_type,
                confidence: outcome.document.confidence,
                needs_review: outcome.needs_review,
                summary: outcome.summary,
                fields: outcome.fields,
                suggestions: outcome.suggestions,
            }))
        }
        Err(e) => {
            if let (Some(notifier), PipelineError::StageFailed { stage, .. }) = (&state.notifier, &e) {
                notifier.notify_in_background(
                    user.email.clone(),
                    locale,
                    DocumentEvent::Failed {
                        filename,
                        reason: format!("{} stage", stage),
                    },
                );
            }
            Err(e.into_response())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/documents/upload",
    tag = "documents",
    security(
        ("bearer_auth" = [])
    ),
    params(JobStatusQuery),
    responses(
        (status = 200, description = "Upload job status", body = JobStatusResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_upload_status(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(query): Query<JobStatusQuery>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job = state
        .db
        .get_upload_job(query.job_id, auth_user.user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(job.into()))
}

async fn read_upload_form(mut multipart: Multipart, limit_mb: u64) -> Result<UploadForm, UploadError> {
    let mut file = None;
    let mut project_id = None;
    let mut client_id = None;
    let mut locale = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let declared_type = field.content_type().map(|c| c.to_string());
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit_mb))?;
                file = Some((filename, declared_type, data.to_vec()));
            }
            "project_id" => project_id = optional_uuid(&name, field.text().await)?,
            "client_id" => client_id = optional_uuid(&name, field.text().await)?,
            "locale" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::MalformedMultipart { details: e.to_string() })?;
                if !value.trim().is_empty() {
                    locale = Some(Locale::parse(&value).ok_or_else(|| UploadError::InvalidField {
                        field: name.clone(),
                        reason: format!("unsupported locale '{}'", value.trim()),
                    })?);
                }
            }
            _ => {}
        }
    }

    let (filename, declared_type, data) = file.ok_or(UploadError::MissingFile)?;
    Ok(UploadForm { filename, declared_type, data, project_id, client_id, locale })
}

/// Hitting the body limit surfaces as a multipart read error.
fn multipart_error(e: MultipartError, limit_mb: u64) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge { limit_mb }
    } else {
        UploadError::MalformedMultipart { details: e.body_text() }
    }
}

fn optional_uuid<E: std::fmt::Display>(field: &str, value: Result<String, E>) -> Result<Option<Uuid>, UploadError> {
    let value = value.map_err(|e| UploadError::MalformedMultipart { details: e.to_string() })?;
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(value).map(Some).map_err(|_| UploadError::InvalidField {
        field: field.to_string(),
        reason: "must be a UUID".to_string(),
    })
}

/// Gate the upload on the subscription, then reserve this upload's share of
/// the monthly quota. Reserved quota is not returned if processing fails.
async fn reserve_quota(state: &AppState, user: &User, size: i64) -> Result<(), UsageError> {
    if !user.subscription_status.allows_processing() {
        return Err(UsageError::SubscriptionInactive {
            tier: user.plan_tier,
            status: user.subscription_status,
        });
    }

    let mut amounts = vec![(UsageResource::Documents, 1), (UsageResource::StorageBytes, size)];
    if state.analyzer.is_remote() {
        amounts.push((UsageResource::AiRequests, AI_REQUESTS_PER_UPLOAD));
    }
    state
        .db
        .record_usage(user.id, &amounts, &user.plan_tier.limits())
        .await?;
    Ok(())
}
