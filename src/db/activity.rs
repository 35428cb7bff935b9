use anyhow::Result;
use uuid::Uuid;

use crate::models::ActivityEntry;
use super::Database;

impl Database {
    pub async fn create_activity_entry(&self, entry: &ActivityEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, user_id, organization_id, action, entity_type, entity_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.organization_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent first.
    pub async fn get_recent_activity(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, user_id, organization_id, action, entity_type, entity_id, details, created_at
            FROM activity_log
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
