//! Feedback domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `Pending → Resolved`; resolution is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedbackStatus {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    /// 1–5 satisfaction rating, if given.
    pub rating: Option<u8>,
    pub status: FeedbackStatus,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedback {
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub rating: Option<u8>,
}
