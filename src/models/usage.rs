use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::errors::usage::UsageError;

const MIB: i64 = 1024 * 1024;
const GIB: i64 = 1024 * MIB;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum PlanTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "starter")]
    Starter,
    #[serde(rename = "professional")]
    Professional,
    #[serde(rename = "business")]
    Business,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum SubscriptionStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "trialing")]
    Trialing,
    #[serde(rename = "past_due")]
    PastDue,
    #[serde(rename = "canceled")]
    Canceled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum UsageResource {
    #[serde(rename = "documents")]
    Documents,
    #[serde(rename = "audio_minutes")]
    AudioMinutes,
    #[serde(rename = "storage_bytes")]
    StorageBytes,
    #[serde(rename = "ai_requests")]
    AiRequests,
}

/// Monthly quota per resource. `None` means unlimited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PlanLimits {
    pub documents: Option<i64>,
    pub audio_minutes: Option<i64>,
    pub storage_bytes: Option<i64>,
    pub ai_requests: Option<i64>,
}

impl PlanTier {
    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                documents: Some(10),
                audio_minutes: Some(0),
                storage_bytes: Some(100 * MIB),
                ai_requests: Some(25),
            },
            PlanTier::Starter => PlanLimits {
                documents: Some(100),
                audio_minutes: Some(60),
                storage_bytes: Some(2 * GIB),
                ai_requests: Some(250),
            },
            PlanTier::Professional => PlanLimits {
                documents: Some(1000),
                audio_minutes: Some(600),
                storage_bytes: Some(20 * GIB),
                ai_requests: Some(2500),
            },
            PlanTier::Business => PlanLimits {
                documents: None,
                audio_minutes: None,
                storage_bytes: None,
                ai_requests: None,
            },
        }
    }
}

impl PlanLimits {
    pub fn for_resource(&self, resource: UsageResource) -> Option<i64> {
        match resource {
            UsageResource::Documents => self.documents,
            UsageResource::AudioMinutes => self.audio_minutes,
            UsageResource::StorageBytes => self.storage_bytes,
            UsageResource::AiRequests => self.ai_requests,
        }
    }
}

impl SubscriptionStatus {
    pub fn allows_processing(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTier::Free => write!(f, "free"),
            PlanTier::Starter => write!(f, "starter"),
            PlanTier::Professional => write!(f, "professional"),
            PlanTier::Business => write!(f, "business"),
        }
    }
}

impl TryFrom<String> for PlanTier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "free" => Ok(PlanTier::Free),
            "starter" => Ok(PlanTier::Starter),
            "professional" => Ok(PlanTier::Professional),
            "business" => Ok(PlanTier::Business),
            _ => Err(format!("Invalid plan tier: {}", value)),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Trialing => write!(f, "trialing"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl TryFrom<String> for SubscriptionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            _ => Err(format!("Invalid subscription status: {}", value)),
        }
    }
}

impl std::fmt::Display for UsageResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageResource::Documents => write!(f, "documents"),
            UsageResource::AudioMinutes => write!(f, "audio_minutes"),
            UsageResource::StorageBytes => write!(f, "storage_bytes"),
            UsageResource::AiRequests => write!(f, "ai_requests"),
        }
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UsageCounters {
    pub user_id: Uuid,
    pub period_start: NaiveDate,
    pub documents_processed: i64,
    pub audio_minutes: i64,
    pub storage_bytes: i64,
    pub ai_requests: i64,
    pub updated_at: DateTime<Utc>,
}

impl UsageCounters {
    pub fn new(user_id: Uuid, today: NaiveDate) -> Self {
        Self {
            user_id,
            period_start: month_start(today),
            documents_processed: 0,
            audio_minutes: 0,
            storage_bytes: 0,
            ai_requests: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn get(&self, resource: UsageResource) -> i64 {
        match resource {
            UsageResource::Documents => self.documents_processed,
            UsageResource::AudioMinutes => self.audio_minutes,
            UsageResource::StorageBytes => self.storage_bytes,
            UsageResource::AiRequests => self.ai_requests,
        }
    }

    fn slot(&mut self, resource: UsageResource) -> &mut i64 {
        match resource {
            UsageResource::Documents => &mut self.documents_processed,
            UsageResource::AudioMinutes => &mut self.audio_minutes,
            UsageResource::StorageBytes => &mut self.storage_bytes,
            UsageResource::AiRequests => &mut self.ai_requests,
        }
    }

    /// Reset every counter when `today` falls in a later month than the
    /// current period. Returns true when a reset happened.
    pub fn rollover(&mut self, today: NaiveDate) -> bool {
        let current = month_start(today);
        if current <= self.period_start {
            return false;
        }
        self.period_start = current;
        self.documents_processed = 0;
        self.audio_minutes = 0;
        self.storage_bytes = 0;
        self.ai_requests = 0;
        self.updated_at = Utc::now();
        true
    }

    pub fn check(&self, resource: UsageResource, amount: i64, limits: &PlanLimits) -> Result<(), UsageError> {
        if amount < 0 {
            return Err(UsageError::NegativeAmount { resource, amount });
        }
        let used = self.get(resource);
        if let Some(limit) = limits.for_resource(resource) {
            if used.saturating_add(amount) > limit {
                return Err(UsageError::LimitExceeded { resource, used, requested: amount, limit });
            }
        }
        Ok(())
    }

    pub fn increment(&mut self, resource: UsageResource, amount: i64, limits: &PlanLimits) -> Result<(), UsageError> {
        self.check(resource, amount, limits)?;
        let slot = self.slot(resource);
        *slot = slot.saturating_add(amount);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn remaining(&self, resource: UsageResource, limits: &PlanLimits) -> Option<i64> {
        limits
            .for_resource(resource)
            .map(|limit| (limit - self.get(resource)).max(0))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub plan_tier: PlanTier,
    pub subscription_status: SubscriptionStatus,
    pub period_start: NaiveDate,
    pub usage: UsageCounters,
    pub limits: PlanLimits,
    pub remaining: PlanLimits,
}

impl UsageResponse {
    pub fn new(plan_tier: PlanTier, subscription_status: SubscriptionStatus, usage: UsageCounters) -> Self {
        let limits = plan_tier.limits();
        let remaining = PlanLimits {
            documents: usage.remaining(UsageResource::Documents, &limits),
            audio_minutes: usage.remaining(UsageResource::AudioMinutes, &limits),
            storage_bytes: usage.remaining(UsageResource::StorageBytes, &limits),
            ai_requests: usage.remaining(UsageResource::AiRequests, &limits),
        };
        Self {
            plan_tier,
            subscription_status,
            period_start: usage.period_start,
            usage,
            limits,
            remaining,
        }
    }
}
