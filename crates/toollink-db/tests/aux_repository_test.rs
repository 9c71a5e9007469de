//! Integration tests for the notification, feedback, report,
//! prediction, activity and settings repositories.

use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_core::ToolLinkError;
use toollink_core::models::activity::{ActivityAction, ActivityOutcome, CreateActivity};
use toollink_core::models::feedback::{CreateFeedback, FeedbackStatus};
use toollink_core::models::notification::{CreateNotification, NotificationStatus};
use toollink_core::models::prediction::CreatePrediction;
use toollink_core::models::report::{CreateReport, ReportStatus, ReportType};
use toollink_core::models::settings::UpdateSettings;
use toollink_core::repository::{
    ActivityFilter, ActivityLogRepository, FeedbackFilter, FeedbackRepository,
    NotificationRepository, Pagination, PredictionRepository, ReportRepository,
    SettingsRepository,
};
use toollink_db::repository::{
    SurrealActivityLogRepository, SurrealFeedbackRepository, SurrealNotificationRepository,
    SurrealPredictionRepository, SurrealReportRepository, SurrealSettingsRepository,
};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn notification_lifecycle() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let user = Uuid::new_v4();

    let created = repo
        .create(CreateNotification {
            user_id: user,
            title: "Low stock".into(),
            message: "SAN-100 fell below its reorder threshold".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.status, NotificationStatus::Unread);
    assert!(created.read_at.is_none());

    let read = repo.mark_read(created.id).await.unwrap();
    assert_eq!(read.status, NotificationStatus::Read);
    assert!(read.read_at.is_some());

    // Marking again keeps the original read timestamp.
    let again = repo.mark_read(created.id).await.unwrap();
    assert_eq!(again.read_at, read.read_at);

    repo.delete(created.id).await.unwrap();
    let gone = repo.get_by_id(created.id).await;
    assert!(matches!(gone, Err(ToolLinkError::NotFound { .. })));
}

#[tokio::test]
async fn notification_list_scoped_to_user() {
    let db = setup().await;
    let repo = SurrealNotificationRepository::new(db);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for user in [alice, alice, bob] {
        repo.create(CreateNotification {
            user_id: user,
            title: "Update".into(),
            message: "Order status changed".into(),
        })
        .await
        .unwrap();
    }

    let hers = repo.list(Some(alice), Pagination::default()).await.unwrap();
    assert_eq!(hers.total, 2);

    let all = repo.list(None, Pagination::default()).await.unwrap();
    assert_eq!(all.total, 3);
}

#[tokio::test]
async fn feedback_resolution_is_terminal() {
    let db = setup().await;
    let repo = SurrealFeedbackRepository::new(db);
    let author = Uuid::new_v4();
    let resolver = Uuid::new_v4();

    let feedback = repo
        .create(CreateFeedback {
            user_id: author,
            subject: "Checkout".into(),
            message: "Delivery date picker is confusing".into(),
            rating: Some(3),
        })
        .await
        .unwrap();
    assert_eq!(feedback.status, FeedbackStatus::Pending);
    assert_eq!(feedback.rating, Some(3));

    let resolved = repo.resolve(feedback.id, resolver).await.unwrap();
    assert_eq!(resolved.status, FeedbackStatus::Resolved);
    assert_eq!(resolved.resolved_by, Some(resolver));

    let twice = repo.resolve(feedback.id, resolver).await;
    assert!(matches!(twice, Err(ToolLinkError::Conflict { .. })));
}

#[tokio::test]
async fn feedback_list_filters_by_status() {
    let db = setup().await;
    let repo = SurrealFeedbackRepository::new(db);
    let author = Uuid::new_v4();

    let open = repo
        .create(CreateFeedback {
            user_id: author,
            subject: "One".into(),
            message: "first".into(),
            rating: None,
        })
        .await
        .unwrap();
    let closed = repo
        .create(CreateFeedback {
            user_id: author,
            subject: "Two".into(),
            message: "second".into(),
            rating: None,
        })
        .await
        .unwrap();
    repo.resolve(closed.id, Uuid::new_v4()).await.unwrap();

    let pending = repo
        .list(
            FeedbackFilter {
                status: Some(FeedbackStatus::Pending),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].id, open.id);
}

#[tokio::test]
async fn report_lifecycle_complete_and_fail() {
    let db = setup().await;
    let repo = SurrealReportRepository::new(db);
    let requester = Uuid::new_v4();

    let report = repo
        .create(CreateReport {
            requested_by: requester,
            report_type: ReportType::Sales,
            parameters: json!({"window_days": 30}),
        })
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Generating);
    assert_eq!(report.parameters, json!({"window_days": 30}));

    let done = repo
        .complete(report.id, json!({"revenue": 1234.56}))
        .await
        .unwrap();
    assert_eq!(done.status, ReportStatus::Completed);
    assert_eq!(done.result, Some(json!({"revenue": 1234.56})));
    assert!(done.completed_at.is_some());

    let broken = repo
        .create(CreateReport {
            requested_by: requester,
            report_type: ReportType::Inventory,
            parameters: json!({}),
        })
        .await
        .unwrap();
    let failed = repo
        .fail(broken.id, "aggregation query failed".into())
        .await
        .unwrap();
    assert_eq!(failed.status, ReportStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("aggregation query failed"));

    let listed = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(listed.total, 2);
}

#[tokio::test]
async fn predictions_filter_by_item() {
    let db = setup().await;
    let repo = SurrealPredictionRepository::new(db);
    let drill = Uuid::new_v4();
    let sander = Uuid::new_v4();
    let analyst = Uuid::new_v4();

    for (item, qty) in [(drill, 14), (drill, 18), (sander, 6)] {
        repo.create(CreatePrediction {
            item_id: item,
            window_days: 30,
            predicted_quantity: qty,
            confidence: 0.7,
            created_by: analyst,
        })
        .await
        .unwrap();
    }

    let for_drill = repo.list(Some(drill), Pagination::default()).await.unwrap();
    assert_eq!(for_drill.total, 2);
    assert!(for_drill.items.iter().all(|p| p.item_id == drill));
}

#[tokio::test]
async fn activity_log_appends_and_filters() {
    let db = setup().await;
    let repo = SurrealActivityLogRepository::new(db);
    let actor = Uuid::new_v4();
    let other = Uuid::new_v4();

    let entry = repo
        .append(CreateActivity {
            actor_id: Some(actor),
            action: ActivityAction::OrderCreated,
            entity_type: "order".into(),
            entity_id: Some(Uuid::new_v4()),
            before: None,
            after: Some(json!({"status": "Pending"})),
            ip_address: Some("203.0.113.9".into()),
            outcome: ActivityOutcome::Success,
        })
        .await
        .unwrap();
    assert_eq!(entry.action, ActivityAction::OrderCreated);
    assert_eq!(entry.after, Some(json!({"status": "Pending"})));

    repo.append(CreateActivity::success(
        Some(other),
        ActivityAction::InventoryAdjusted,
        "inventory_item",
        Uuid::new_v4(),
    ))
    .await
    .unwrap();

    let by_actor = repo
        .list(
            ActivityFilter {
                actor_id: Some(actor),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_actor.total, 1);

    let by_entity = repo
        .list(
            ActivityFilter {
                entity_type: Some("inventory_item".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_entity.total, 1);
    assert_eq!(by_entity.items[0].action, ActivityAction::InventoryAdjusted);
}

#[tokio::test]
async fn settings_default_until_first_write() {
    let db = setup().await;
    let repo = SurrealSettingsRepository::new(db);

    let initial = repo.get().await.unwrap();
    assert_eq!(initial.tax_rate, 0.0);
    assert_eq!(initial.currency, "USD");
    assert!(initial.low_stock_alerts);

    let updated = repo
        .update(UpdateSettings {
            tax_rate: Some(0.08),
            delivery_charge: Some(4.5),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.tax_rate, 0.08);
    assert_eq!(updated.delivery_charge, 4.5);
    assert_eq!(updated.currency, "USD");

    // A later partial update keeps earlier values.
    let again = repo
        .update(UpdateSettings {
            currency: Some("EUR".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(again.tax_rate, 0.08);
    assert_eq!(again.currency, "EUR");
}
