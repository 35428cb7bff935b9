use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    models::{DocumentDetailResponse, DocumentResponse, DocumentType, PaginatedDocumentsResponse},
    AppState,
};

use super::types::PaginationQuery;

#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    security(
        ("bearer_auth" = [])
    ),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated list of the caller's documents", body = PaginatedDocumentsResponse),
        (status = 400, description = "Unknown document type filter"),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedDocumentsResponse>, ApiError> {
    let (limit, offset) = query.bounds();
    let document_type = query
        .document_type
        .clone()
        .filter(|t| !t.trim().is_empty())
        .map(DocumentType::try_from)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let user_id = auth_user.user.id;
    let documents = state
        .db
        .get_documents_by_user(user_id, document_type, limit, offset)
        .await?;
    let total = state.db.count_documents_by_user(user_id, document_type).await?;
    debug!("Listing {} of {} documents for user {}", documents.len(), total, user_id);

    let documents: Vec<DocumentResponse> = documents.into_iter().map(DocumentResponse::from).collect();
    let has_more = offset + (documents.len() as i64) < total;

    Ok(Json(PaginatedDocumentsResponse {
        documents,
        total,
        limit,
        offset,
        has_more,
    }))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document with its extracted invoice, if any", body = DocumentDetailResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get_document_by_id(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentDetailResponse>, ApiError> {
    let user_id = auth_user.user.id;
    let document = state
        .db
        .get_document_by_id(document_id, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let invoice = if document.document_type.is_billing() {
        state.db.get_invoice_by_document_id(document.id, user_id).await?
    } else {
        None
    };

    Ok(Json(DocumentDetailResponse {
        document: document.into(),
        invoice,
    }))
}
