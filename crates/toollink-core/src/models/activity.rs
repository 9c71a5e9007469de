//! Activity (audit log) domain model.
//!
//! Append-only: entries are never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed action vocabulary recorded in the audit trail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityAction {
    UserRegistered,
    UserLoggedIn,
    LoginFailed,
    UserApproved,
    UserRejected,
    UserUpdated,
    UserDeleted,
    UsersBulkCreated,
    PasswordChanged,
    OrderCreated,
    OrderStatusChanged,
    OrderDeleted,
    InventoryCreated,
    InventoryUpdated,
    InventoryAdjusted,
    InventoryDeleted,
    NotificationCreated,
    FeedbackSubmitted,
    FeedbackResolved,
    ReportGenerated,
    PredictionCreated,
    ConfigUpdated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityOutcome {
    Success,
    Failure,
    /// Bulk operations where only a subset of rows succeeded.
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub outcome: ActivityOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivity {
    pub actor_id: Option<Uuid>,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub outcome: ActivityOutcome,
}

impl CreateActivity {
    /// Shorthand for the common successful single-entity case.
    pub fn success(
        actor_id: Option<Uuid>,
        action: ActivityAction,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_type: entity_type.to_string(),
            entity_id: Some(entity_id),
            before: None,
            after: None,
            ip_address: None,
            outcome: ActivityOutcome::Success,
        }
    }
}
