use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use axum::Router;
use std::sync::Arc;

use crate::{
    analysis::Classification,
    models::{
        CreateUser, DocumentDetailResponse, DocumentResponse, DocumentType, ExtractedFields,
        ExtractedInvoice, JobStage, JobStatus, JobStatusResponse, LineItem, LoginRequest,
        LoginResponse, Locale, PaginatedDocumentsResponse, PlanLimits, PlanTier, Suggestion,
        SuggestionPriority, SubscriptionStatus, TaxLine, UploadResponse, UsageCounters,
        UsageResponse, UserResponse, UserRole,
    },
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,
        // Document endpoints
        crate::routes::documents::upload_document,
        crate::routes::documents::get_upload_status,
        crate::routes::documents::list_documents,
        crate::routes::documents::get_document_by_id,
        // Usage endpoints
        crate::routes::usage::get_usage,
    ),
    components(
        schemas(
            CreateUser, LoginRequest, LoginResponse, UserResponse, UserRole, Locale,
            DocumentResponse, DocumentDetailResponse, PaginatedDocumentsResponse, DocumentType,
            UploadResponse, JobStatusResponse, JobStatus, JobStage, Classification,
            ExtractedFields, ExtractedInvoice, TaxLine, LineItem, Suggestion, SuggestionPriority,
            UsageResponse, UsageCounters, PlanLimits, PlanTier, SubscriptionStatus,
            crate::routes::documents::UploadForm
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "documents", description = "Document upload, processing status and retrieval"),
        (name = "usage", description = "Monthly plan usage"),
    ),
    info(
        title = "Dossier API",
        version = "0.3.0",
        description = "Bilingual document intake, classification and extraction API"
    ),
    servers(
        (url = "/api", description = "API base path")
    )
)]
pub struct ApiDoc;

pub fn create_swagger_router() -> Router<Arc<AppState>> {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
