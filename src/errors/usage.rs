use axum::http::StatusCode;
use thiserror::Error;

use super::{AppError, ErrorSeverity, impl_into_response};
use crate::models::{PlanTier, SubscriptionStatus, UsageResource};

/// Plan and subscription gating errors
#[derive(Error, Debug, PartialEq)]
pub enum UsageError {
    #[error("Monthly {resource} limit reached: {used} used, {requested} requested, limit {limit}")]
    LimitExceeded {
        resource: UsageResource,
        used: i64,
        requested: i64,
        limit: i64,
    },

    #[error("Usage amount for {resource} cannot be negative ({amount})")]
    NegativeAmount { resource: UsageResource, amount: i64 },

    #[error("Subscription is {status} on plan {tier}")]
    SubscriptionInactive { tier: PlanTier, status: SubscriptionStatus },

    #[error("Database error while recording usage: {message}")]
    Storage { message: String },
}

impl AppError for UsageError {
    fn status_code(&self) -> StatusCode {
        match self {
            UsageError::LimitExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            UsageError::NegativeAmount { .. } => StatusCode::BAD_REQUEST,
            UsageError::SubscriptionInactive { .. } => StatusCode::FORBIDDEN,
            UsageError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            UsageError::LimitExceeded { resource, limit, .. } => {
                format!("Your plan's monthly {} limit ({}) has been reached", resource, limit)
            }
            UsageError::NegativeAmount { .. } => "Invalid usage amount".to_string(),
            UsageError::SubscriptionInactive { status, .. } => {
                format!("Your subscription is {}", status)
            }
            UsageError::Storage { .. } => "An internal error occurred".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UsageError::LimitExceeded { .. } => "USAGE_LIMIT_EXCEEDED",
            UsageError::NegativeAmount { .. } => "USAGE_NEGATIVE_AMOUNT",
            UsageError::SubscriptionInactive { .. } => "USAGE_SUBSCRIPTION_INACTIVE",
            UsageError::Storage { .. } => "USAGE_STORAGE_ERROR",
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            UsageError::Storage { .. } => ErrorSeverity::Critical,
            UsageError::NegativeAmount { .. } => ErrorSeverity::Important,
            _ => ErrorSeverity::Expected,
        }
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            UsageError::LimitExceeded { .. } => Some("Upgrade your plan or wait for next month's reset".to_string()),
            UsageError::SubscriptionInactive { .. } => Some("Update your billing details to resume processing".to_string()),
            _ => None,
        }
    }
}

impl_into_response!(UsageError);

impl From<anyhow::Error> for UsageError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<UsageError>() {
            Ok(usage) => usage,
            Err(other) => UsageError::Storage { message: other.to_string() },
        }
    }
}
