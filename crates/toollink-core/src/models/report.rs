//! Report domain model.
//!
//! Generation runs synchronously within the request that created the
//! record; the status field still transitions
//! `Generating → Completed | Failed` so clients observe a uniform
//! lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportType {
    Sales,
    Inventory,
    Activity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub requested_by: Uuid,
    pub report_type: ReportType,
    pub parameters: serde_json::Value,
    pub status: ReportStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReport {
    pub requested_by: Uuid,
    pub report_type: ReportType,
    pub parameters: serde_json::Value,
}
