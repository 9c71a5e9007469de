//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use surrealdb::{Connection, Surreal};
use toollink_auth::{AuthConfig, AuthService};
use toollink_core::models::activity::CreateActivity;
use toollink_core::rbac::{AccessPolicy, Permission, Role};
use toollink_core::repository::ActivityLogRepository;
use toollink_db::repository::{
    SurrealActivityLogRepository, SurrealFeedbackRepository, SurrealInventoryRepository,
    SurrealNotificationRepository, SurrealOrderRepository, SurrealPredictionRepository,
    SurrealReportRepository, SurrealSessionRepository, SurrealSettingsRepository,
    SurrealUserRepository,
};

use crate::error::ApiError;
use crate::ratelimit::RateLimiter;

pub type Auth<C> = AuthService<
    SurrealUserRepository<C>,
    SurrealSessionRepository<C>,
    SurrealActivityLogRepository<C>,
>;

struct Inner<C: Connection> {
    users: SurrealUserRepository<C>,
    orders: SurrealOrderRepository<C>,
    inventory: SurrealInventoryRepository<C>,
    activities: SurrealActivityLogRepository<C>,
    notifications: SurrealNotificationRepository<C>,
    feedback: SurrealFeedbackRepository<C>,
    reports: SurrealReportRepository<C>,
    predictions: SurrealPredictionRepository<C>,
    settings: SurrealSettingsRepository<C>,
    auth: Auth<C>,
    policy: AccessPolicy,
    login_limiter: RateLimiter,
}

/// Cheap-to-clone handle shared across all request handlers.
pub struct AppState<C: Connection> {
    inner: Arc<Inner<C>>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connection> AppState<C> {
    pub fn new(
        db: Surreal<C>,
        auth_config: AuthConfig,
        rate_limit_max: u32,
        rate_limit_window: Duration,
    ) -> Self {
        let auth = AuthService::new(
            SurrealUserRepository::new(db.clone()),
            SurrealSessionRepository::new(db.clone()),
            SurrealActivityLogRepository::new(db.clone()),
            auth_config,
        );

        Self {
            inner: Arc::new(Inner {
                users: SurrealUserRepository::new(db.clone()),
                orders: SurrealOrderRepository::new(db.clone()),
                inventory: SurrealInventoryRepository::new(db.clone()),
                activities: SurrealActivityLogRepository::new(db.clone()),
                notifications: SurrealNotificationRepository::new(db.clone()),
                feedback: SurrealFeedbackRepository::new(db.clone()),
                reports: SurrealReportRepository::new(db.clone()),
                predictions: SurrealPredictionRepository::new(db.clone()),
                settings: SurrealSettingsRepository::new(db),
                auth,
                policy: AccessPolicy,
                login_limiter: RateLimiter::new(rate_limit_max, rate_limit_window),
            }),
        }
    }

    pub fn users(&self) -> &SurrealUserRepository<C> {
        &self.inner.users
    }

    pub fn orders(&self) -> &SurrealOrderRepository<C> {
        &self.inner.orders
    }

    pub fn inventory(&self) -> &SurrealInventoryRepository<C> {
        &self.inner.inventory
    }

    pub fn activities(&self) -> &SurrealActivityLogRepository<C> {
        &self.inner.activities
    }

    pub fn notifications(&self) -> &SurrealNotificationRepository<C> {
        &self.inner.notifications
    }

    pub fn feedback(&self) -> &SurrealFeedbackRepository<C> {
        &self.inner.feedback
    }

    pub fn reports(&self) -> &SurrealReportRepository<C> {
        &self.inner.reports
    }

    pub fn predictions(&self) -> &SurrealPredictionRepository<C> {
        &self.inner.predictions
    }

    pub fn settings(&self) -> &SurrealSettingsRepository<C> {
        &self.inner.settings
    }

    pub fn auth(&self) -> &Auth<C> {
        &self.inner.auth
    }

    pub fn login_limiter(&self) -> &RateLimiter {
        &self.inner.login_limiter
    }

    /// Evaluate the access policy for one guarded operation.
    pub fn authorize(&self, role: Role, permission: Permission) -> Result<(), ApiError> {
        if self.inner.policy.permits(role, permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    /// Append an audit entry; failures are logged, never propagated.
    pub async fn record(&self, entry: CreateActivity) {
        if let Err(e) = self.inner.activities.append(entry).await {
            tracing::warn!(error = %e, "failed to append activity entry");
        }
    }
}
