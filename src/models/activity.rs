use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTION_DOCUMENT_UPLOADED: &str = "document.uploaded";
pub const ACTION_DOCUMENT_PROCESSED: &str = "document.processed";
pub const ACTION_DOCUMENT_FAILED: &str = "document.failed";

/// One audit-trail row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        user_id: Uuid,
        organization_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            organization_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }
}
