//! SurrealDB repository implementations.

mod activity;
mod feedback;
mod inventory;
mod notification;
mod order;
mod prediction;
mod report;
mod session;
mod settings;
mod user;

pub use activity::SurrealActivityLogRepository;
pub use feedback::SurrealFeedbackRepository;
pub use inventory::SurrealInventoryRepository;
pub use notification::SurrealNotificationRepository;
pub use order::SurrealOrderRepository;
pub use prediction::SurrealPredictionRepository;
pub use report::SurrealReportRepository;
pub use session::SurrealSessionRepository;
pub use settings::SurrealSettingsRepository;
pub use user::SurrealUserRepository;
