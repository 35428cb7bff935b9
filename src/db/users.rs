use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::models::{CreateUser, Locale, PlanTier, SubscriptionStatus, User, UserRole};
use super::Database;

const USER_FIELDS: &str = "id, username, email, password_hash, role, organization_id, preferred_locale, \
     plan_tier, subscription_status, created_at, updated_at";

fn map_row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get::<String, _>("role").try_into().unwrap_or(UserRole::Member),
        organization_id: row.get("organization_id"),
        preferred_locale: row.get::<String, _>("preferred_locale").try_into().unwrap_or_default(),
        plan_tier: row.get::<String, _>("plan_tier").try_into().unwrap_or(PlanTier::Free),
        subscription_status: row
            .get::<String, _>("subscription_status")
            .try_into()
            .unwrap_or(SubscriptionStatus::Canceled),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl Database {
    /// New accounts start as the owner of their own workspace on the free plan.
    pub async fn create_user(&self, user: CreateUser) -> Result<User> {
        let password_hash = bcrypt::hash(&user.password, 12)?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, organization_id, preferred_locale,
                               plan_tier, subscription_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            USER_FIELDS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(UserRole::Owner.to_string())
        .bind(user.organization_id)
        .bind(user.preferred_locale.unwrap_or(Locale::En).to_string())
        .bind(PlanTier::Free.to_string())
        .bind(SubscriptionStatus::Active.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_row_to_user(&row))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = $1", USER_FIELDS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| map_row_to_user(&r)))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_FIELDS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| map_row_to_user(&r)))
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_FIELDS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| map_row_to_user(&r)))
    }

    /// Set by billing; payment flows themselves live outside this service.
    pub async fn update_user_subscription(
        &self,
        user_id: Uuid,
        plan_tier: PlanTier,
        subscription_status: SubscriptionStatus,
    ) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET plan_tier = $2, subscription_status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_FIELDS
        ))
        .bind(user_id)
        .bind(plan_tier.to_string())
        .bind(subscription_status.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| map_row_to_user(&r)))
    }
}
