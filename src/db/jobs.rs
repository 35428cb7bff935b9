use anyhow::Result;
use uuid::Uuid;

use crate::models::UploadJob;
use super::Database;

const JOB_FIELDS: &str = "id, user_id, organization_id, project_id, client_id, filename, file_size, mime_type, \
     status, stage, progress, error_message, document_id, created_at, updated_at, completed_at";

impl Database {
    pub async fn create_upload_job(&self, job: &UploadJob) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO upload_jobs (id, user_id, organization_id, project_id, client_id, filename, file_size,
                                     mime_type, status, stage, progress, error_message, document_id,
                                     created_at, updated_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(job.id)
        .bind(job.user_id)
        .bind(job.organization_id)
        .bind(job.project_id)
        .bind(job.client_id)
        .bind(&job.filename)
        .bind(job.file_size)
        .bind(&job.mime_type)
        .bind(job.status.to_string())
        .bind(job.stage.to_string())
        .bind(job.progress)
        .bind(&job.error_message)
        .bind(job.document_id)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist the mutable part of a job. Progress is never written
    /// backwards: the stored value is the max of the old and new values.
    pub async fn update_upload_job(&self, job: &UploadJob) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE upload_jobs
            SET status = $2,
                stage = $3,
                progress = GREATEST(progress, $4),
                error_message = $5,
                document_id = $6,
                updated_at = $7,
                completed_at = $8
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.status.to_string())
        .bind(job.stage.to_string())
        .bind(job.progress)
        .bind(&job.error_message)
        .bind(job.document_id)
        .bind(job.updated_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("Upload job {} does not exist", job.id));
        }
        Ok(())
    }

    /// Jobs are only visible to the user who created them.
    pub async fn get_upload_job(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<UploadJob>> {
        let job = sqlx::query_as::<_, UploadJob>(&format!(
            "SELECT {} FROM upload_jobs WHERE id = $1 AND user_id = $2",
            JOB_FIELDS
        ))
        .bind(job_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }
}
