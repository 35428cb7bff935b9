use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use super::{Locale, PlanTier, SubscriptionStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, ToSchema)]
pub enum UserRole {
    #[serde(rename = "owner")]
    Owner,
    #[serde(rename = "member")]
    Member,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Owner => write!(f, "owner"),
            UserRole::Member => write!(f, "member"),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "owner" => Ok(UserRole::Owner),
            "member" => Ok(UserRole::Member),
            _ => Err(format!("Invalid user role: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub organization_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub preferred_locale: Locale,
    #[sqlx(try_from = "String")]
    pub plan_tier: PlanTier,
    #[sqlx(try_from = "String")]
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub preferred_locale: Option<Locale>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    /// hCaptcha response token, required when captcha verification is enabled
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub preferred_locale: Locale,
    pub plan_tier: PlanTier,
    pub subscription_status: SubscriptionStatus,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            preferred_locale: user.preferred_locale,
            plan_tier: user.plan_tier,
            subscription_status: user.subscription_status,
        }
    }
}
