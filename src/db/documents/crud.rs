use anyhow::Result;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::helpers::{apply_owner_filter, apply_pagination, map_row_to_document, DOCUMENT_FIELDS};
use crate::db::Database;
use crate::models::{Document, DocumentType};

impl Database {
    pub async fn create_document(&self, document: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, organization_id, project_id, client_id, job_id,
                                   filename, original_filename, file_path, file_size, mime_type, file_hash,
                                   extracted_text, document_type, confidence, summary, extracted_fields,
                                   suggestions, language, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(document.id)
        .bind(document.user_id)
        .bind(document.organization_id)
        .bind(document.project_id)
        .bind(document.client_id)
        .bind(document.job_id)
        .bind(&document.filename)
        .bind(&document.original_filename)
        .bind(&document.file_path)
        .bind(document.file_size)
        .bind(&document.mime_type)
        .bind(&document.file_hash)
        .bind(&document.extracted_text)
        .bind(document.document_type.to_string())
        .bind(document.confidence)
        .bind(&document.summary)
        .bind(&document.extracted_fields)
        .bind(&document.suggestions)
        .bind(document.language.to_string())
        .bind(document.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A document is only returned to its owner.
    pub async fn get_document_by_id(&self, document_id: Uuid, user_id: Uuid) -> Result<Option<Document>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(DOCUMENT_FIELDS);
        query.push(" FROM documents");
        apply_owner_filter(&mut query, user_id, None);
        query.push(" AND id = ");
        query.push_bind(document_id);

        let row = query.build().fetch_optional(&self.pool).await?;

        Ok(row.map(|r| map_row_to_document(&r)))
    }

    /// Newest first.
    pub async fn get_documents_by_user(
        &self,
        user_id: Uuid,
        document_type: Option<DocumentType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(DOCUMENT_FIELDS);
        query.push(" FROM documents");
        apply_owner_filter(&mut query, user_id, document_type);
        query.push(" ORDER BY created_at DESC, id");
        apply_pagination(&mut query, limit, offset);

        let rows = query.build().fetch_all(&self.pool).await?;

        Ok(rows.iter().map(map_row_to_document).collect())
    }

    pub async fn count_documents_by_user(&self, user_id: Uuid, document_type: Option<DocumentType>) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM documents");
        apply_owner_filter(&mut query, user_id, document_type);

        let row = query.build().fetch_one(&self.pool).await?;

        Ok(row.get("total"))
    }
}
