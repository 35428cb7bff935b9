use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::models::{month_start, PlanLimits, UsageCounters, UsageResource};
use super::Database;

const USAGE_FIELDS: &str =
    "user_id, period_start, documents_processed, audio_minutes, storage_bytes, ai_requests, updated_at";

impl Database {
    /// Current month's counters, creating or rolling over the row as needed.
    pub async fn get_usage(&self, user_id: Uuid) -> Result<UsageCounters> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        let usage = lock_usage_row(&mut tx, user_id, today).await?;
        tx.commit().await?;
        Ok(usage)
    }

    /// Add every `(resource, amount)` pair atomically.
    ///
    /// The row is locked with `FOR UPDATE` and all amounts are checked
    /// against `limits` before anything is written, so either every counter
    /// moves or none does. Limit failures come back as a
    /// [`UsageError`](crate::errors::usage::UsageError) inside the
    /// `anyhow::Error`.
    pub async fn record_usage(
        &self,
        user_id: Uuid,
        amounts: &[(UsageResource, i64)],
        limits: &PlanLimits,
    ) -> Result<UsageCounters> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        let mut usage = lock_usage_row(&mut tx, user_id, today).await?;

        for (resource, amount) in amounts {
            usage.increment(*resource, *amount, limits)?;
        }

        let usage = sqlx::query_as::<_, UsageCounters>(&format!(
            r#"
            UPDATE usage_counters
            SET documents_processed = $2,
                audio_minutes = $3,
                storage_bytes = $4,
                ai_requests = $5,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            USAGE_FIELDS
        ))
        .bind(user_id)
        .bind(usage.documents_processed)
        .bind(usage.audio_minutes)
        .bind(usage.storage_bytes)
        .bind(usage.ai_requests)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!("Recorded usage for user {}: {:?}", user_id, amounts);
        Ok(usage)
    }
}

/// Select the user's row `FOR UPDATE`, inserting it first when missing and
/// resetting it when the stored period is an earlier month.
async fn lock_usage_row(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<UsageCounters> {
    sqlx::query(
        r#"
        INSERT INTO usage_counters (user_id, period_start)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(month_start(today))
    .execute(&mut **tx)
    .await?;

    let mut usage = sqlx::query_as::<_, UsageCounters>(&format!(
        "SELECT {} FROM usage_counters WHERE user_id = $1 FOR UPDATE",
        USAGE_FIELDS
    ))
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    if usage.rollover(today) {
        tracing::info!("Usage period for user {} rolled over to {}", user_id, usage.period_start);
        usage = sqlx::query_as::<_, UsageCounters>(&format!(
            r#"
            UPDATE usage_counters
            SET period_start = $2, documents_processed = 0, audio_minutes = 0,
                storage_bytes = 0, ai_requests = 0, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            USAGE_FIELDS
        ))
        .bind(user_id)
        .bind(usage.period_start)
        .fetch_one(&mut **tx)
        .await?;
    }

    Ok(usage)
}
