use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::models::{Document, DocumentType};

/// Standard document fields for SELECT queries
pub const DOCUMENT_FIELDS: &str = r#"
    id, user_id, organization_id, project_id, client_id, job_id,
    filename, original_filename, file_path, file_size, mime_type, file_hash,
    extracted_text, document_type, confidence, summary, extracted_fields,
    suggestions, language, created_at
"#;

pub fn map_row_to_document(row: &sqlx::postgres::PgRow) -> Document {
    Document {
        id: row.get("id"),
        user_id: row.get("user_id"),
        organization_id: row.get("organization_id"),
        project_id: row.get("project_id"),
        client_id: row.get("client_id"),
        job_id: row.get("job_id"),
        filename: row.get("filename"),
        original_filename: row.get("original_filename"),
        file_path: row.get("file_path"),
        file_size: row.get("file_size"),
        mime_type: row.get("mime_type"),
        file_hash: row.get("file_hash"),
        extracted_text: row.get("extracted_text"),
        document_type: row
            .get::<String, _>("document_type")
            .try_into()
            .unwrap_or(DocumentType::Other),
        confidence: row.get("confidence"),
        summary: row.get("summary"),
        extracted_fields: row.get("extracted_fields"),
        suggestions: row.get("suggestions"),
        language: row.get::<String, _>("language").try_into().unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

/// Restrict a query to one owner and, optionally, one document type.
pub fn apply_owner_filter(query: &mut QueryBuilder<Postgres>, user_id: Uuid, document_type: Option<DocumentType>) {
    query.push(" WHERE user_id = ");
    query.push_bind(user_id);
    if let Some(document_type) = document_type {
        query.push(" AND document_type = ");
        query.push_bind(document_type.to_string());
    }
}

pub fn apply_pagination(query: &mut QueryBuilder<Postgres>, limit: i64, offset: i64) {
    query.push(" LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);
}
