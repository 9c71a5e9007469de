//! Domain models for ToolLink.
//!
//! One module per persisted entity. Each entity carries a `CreateX`
//! input struct and, where mutation is allowed, an `UpdateX` struct
//! whose fields are all optional (partial-field merge).

pub mod activity;
pub mod feedback;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod prediction;
pub mod report;
pub mod session;
pub mod settings;
pub mod user;
