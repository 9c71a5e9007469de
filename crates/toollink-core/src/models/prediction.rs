//! Demand prediction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Size of the historical window the prediction was derived from.
    pub window_days: u32,
    pub predicted_quantity: u32,
    /// 0.0–1.0 confidence score.
    pub confidence: f64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrediction {
    pub item_id: Uuid,
    pub window_days: u32,
    pub predicted_quantity: u32,
    pub confidence: f64,
    pub created_by: Uuid,
}
