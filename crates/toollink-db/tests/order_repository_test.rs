//! Integration tests for the Order repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_core::ToolLinkError;
use toollink_core::models::order::{
    CreateOrder, DeliveryPreferences, OrderItem, OrderPricing, OrderStatus, UpdateOrder,
    round_currency,
};
use toollink_core::repository::{OrderFilter, OrderRepository, Pagination};
use toollink_db::repository::SurrealOrderRepository;
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();
    db
}

fn new_order(order_number: &str, customer_id: Uuid, quantity: u32, unit_price: f64) -> CreateOrder {
    let items = vec![OrderItem {
        item_id: Uuid::new_v4(),
        name: "Impact Driver".into(),
        quantity,
        unit_price,
        subtotal: round_currency(unit_price * quantity as f64),
    }];
    let pricing = OrderPricing::compute(&items, 0.08, 5.0, 0.0);
    CreateOrder {
        order_number: order_number.into(),
        customer_id,
        items,
        pricing,
        delivery: DeliveryPreferences::default(),
    }
}

#[tokio::test]
async fn create_starts_pending_and_round_trips() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);
    let customer = Uuid::new_v4();

    let order = repo
        .create(new_order("ORD-0001", customer, 2, 49.99))
        .await
        .unwrap();

    assert_eq!(order.order_number, "ORD-0001");
    assert_eq!(order.customer_id, customer);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert!(order.pricing.reconciles());

    let fetched = repo.get_by_id(order.id).await.unwrap();
    assert_eq!(fetched.pricing.total, order.pricing.total);
}

#[tokio::test]
async fn duplicate_order_number_rejected() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);

    repo.create(new_order("ORD-DUP", Uuid::new_v4(), 1, 10.0))
        .await
        .unwrap();

    let result = repo
        .create(new_order("ORD-DUP", Uuid::new_v4(), 1, 10.0))
        .await;
    assert!(matches!(
        result,
        Err(ToolLinkError::DuplicateIdentity { .. })
    ));
}

#[tokio::test]
async fn update_status_and_delivery() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let order = repo
        .create(new_order("ORD-UPD", Uuid::new_v4(), 1, 25.0))
        .await
        .unwrap();

    let updated = repo
        .update(
            order.id,
            UpdateOrder {
                status: Some(OrderStatus::Processing),
                delivery: Some(DeliveryPreferences {
                    address: Some("14 Elm St".into()),
                    instructions: None,
                    preferred_date: None,
                }),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Processing);
    assert_eq!(updated.delivery.address.as_deref(), Some("14 Elm St"));
    // Order number never changes.
    assert_eq!(updated.order_number, "ORD-UPD");
}

#[tokio::test]
async fn soft_deleted_orders_leave_listings() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let keep = repo
        .create(new_order("ORD-KEEP", Uuid::new_v4(), 1, 10.0))
        .await
        .unwrap();
    let drop = repo
        .create(new_order("ORD-DROP", Uuid::new_v4(), 1, 10.0))
        .await
        .unwrap();

    repo.soft_delete(drop.id).await.unwrap();

    let listed = repo
        .list(OrderFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, keep.id);
}

#[tokio::test]
async fn list_scoped_to_customer() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);
    let mine = Uuid::new_v4();
    let theirs = Uuid::new_v4();

    repo.create(new_order("ORD-MINE-1", mine, 1, 10.0))
        .await
        .unwrap();
    repo.create(new_order("ORD-MINE-2", mine, 1, 10.0))
        .await
        .unwrap();
    repo.create(new_order("ORD-THEIRS", theirs, 1, 10.0))
        .await
        .unwrap();

    let scoped = repo
        .list(
            OrderFilter {
                customer_id: Some(mine),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(scoped.total, 2);
    assert!(scoped.items.iter().all(|o| o.customer_id == mine));
}

#[tokio::test]
async fn stats_count_by_status_and_skip_cancelled_revenue() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let a = repo
        .create(new_order("ORD-A", Uuid::new_v4(), 1, 100.0))
        .await
        .unwrap();
    let b = repo
        .create(new_order("ORD-B", Uuid::new_v4(), 1, 50.0))
        .await
        .unwrap();
    let c = repo
        .create(new_order("ORD-C", Uuid::new_v4(), 1, 25.0))
        .await
        .unwrap();

    repo.update(
        a.id,
        UpdateOrder {
            status: Some(OrderStatus::Completed),
            delivery: None,
        },
    )
    .await
    .unwrap();
    repo.update(
        b.id,
        UpdateOrder {
            status: Some(OrderStatus::Cancelled),
            delivery: None,
        },
    )
    .await
    .unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.pending, 1);

    // Cancelled orders contribute nothing to revenue.
    let expected = a.pricing.total + c.pricing.total;
    assert!((stats.revenue - expected).abs() < 0.005);
}

#[tokio::test]
async fn list_since_excludes_cancelled() {
    let db = setup().await;
    let repo = SurrealOrderRepository::new(db);

    let kept = repo
        .create(new_order("ORD-S1", Uuid::new_v4(), 1, 10.0))
        .await
        .unwrap();
    let cancelled = repo
        .create(new_order("ORD-S2", Uuid::new_v4(), 1, 10.0))
        .await
        .unwrap();
    repo.update(
        cancelled.id,
        UpdateOrder {
            status: Some(OrderStatus::Cancelled),
            delivery: None,
        },
    )
    .await
    .unwrap();

    let since = Utc::now() - Duration::hours(1);
    let recent = repo.list_since(since).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, kept.id);
}
