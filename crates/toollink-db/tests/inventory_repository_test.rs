//! Integration tests for the Inventory repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_core::ToolLinkError;
use toollink_core::models::inventory::{
    CreateInventoryItem, StockLocation, SupplierContact, UpdateInventoryItem,
};
use toollink_core::repository::{InventoryFilter, InventoryRepository, Pagination};
use toollink_db::repository::SurrealInventoryRepository;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();
    db
}

fn new_item(sku: &str, quantity: u32, reorder_threshold: u32) -> CreateInventoryItem {
    CreateInventoryItem {
        name: "Orbital Sander".into(),
        category: "power-tools".into(),
        sku: sku.into(),
        description: None,
        quantity,
        unit: "pcs".into(),
        reorder_threshold,
        cost_price: 35.0,
        selling_price: 59.99,
        currency: "USD".into(),
        location: StockLocation::default(),
        supplier: SupplierContact::default(),
    }
}

#[tokio::test]
async fn create_and_fetch_by_sku() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let item = repo.create(new_item("SAN-100", 12, 3)).await.unwrap();
    assert_eq!(item.sku, "SAN-100");
    assert_eq!(item.quantity, 12);
    assert!(item.is_active);
    assert!(!item.is_low_stock());

    let by_sku = repo.get_by_sku("SAN-100").await.unwrap();
    assert_eq!(by_sku.id, item.id);
}

#[tokio::test]
async fn duplicate_sku_rejected() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    repo.create(new_item("SAN-200", 5, 2)).await.unwrap();
    let result = repo.create(new_item("SAN-200", 8, 2)).await;
    assert!(matches!(
        result,
        Err(ToolLinkError::DuplicateIdentity { .. })
    ));
}

#[tokio::test]
async fn adjust_quantity_applies_signed_delta() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let item = repo.create(new_item("DRL-001", 10, 2)).await.unwrap();

    let after_sale = repo.adjust_quantity(item.id, -3).await.unwrap();
    assert_eq!(after_sale.quantity, 7);

    let after_restock = repo.adjust_quantity(item.id, 5).await.unwrap();
    assert_eq!(after_restock.quantity, 12);
}

#[tokio::test]
async fn adjust_quantity_never_goes_negative() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let item = repo.create(new_item("DRL-002", 4, 1)).await.unwrap();

    let result = repo.adjust_quantity(item.id, -5).await;
    assert!(matches!(result, Err(ToolLinkError::Validation { .. })));

    // Rejected adjustment leaves the stock untouched.
    let unchanged = repo.get_by_id(item.id).await.unwrap();
    assert_eq!(unchanged.quantity, 4);

    // Draining to exactly zero is allowed.
    let drained = repo.adjust_quantity(item.id, -4).await.unwrap();
    assert_eq!(drained.quantity, 0);
}

#[tokio::test]
async fn adjust_quantity_missing_item_is_not_found() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let result = repo.adjust_quantity(uuid::Uuid::new_v4(), -1).await;
    assert!(matches!(result, Err(ToolLinkError::NotFound { .. })));
}

#[tokio::test]
async fn update_leaves_sku_and_quantity_alone() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let item = repo.create(new_item("HAM-010", 6, 2)).await.unwrap();

    let updated = repo
        .update(
            item.id,
            UpdateInventoryItem {
                name: Some("Claw Hammer 16oz".into()),
                selling_price: Some(12.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Claw Hammer 16oz");
    assert_eq!(updated.selling_price, 12.5);
    assert_eq!(updated.sku, "HAM-010");
    assert_eq!(updated.quantity, 6);
}

#[tokio::test]
async fn soft_delete_deactivates() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let item = repo.create(new_item("OLD-001", 3, 1)).await.unwrap();
    repo.soft_delete(item.id).await.unwrap();

    let discontinued = repo.get_by_id(item.id).await.unwrap();
    assert!(!discontinued.is_active);

    // Repeating is a no-op.
    repo.soft_delete(item.id).await.unwrap();
}

#[tokio::test]
async fn low_stock_filter_and_count() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    repo.create(new_item("LOW-001", 2, 5)).await.unwrap();
    repo.create(new_item("LOW-002", 5, 5)).await.unwrap();
    repo.create(new_item("OK-001", 20, 5)).await.unwrap();

    let low = repo
        .list(
            InventoryFilter {
                low_stock_only: true,
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(low.total, 2);
    assert!(low.items.iter().all(|i| i.is_low_stock()));

    assert_eq!(repo.count_low_stock().await.unwrap(), 2);
}

#[tokio::test]
async fn category_filter() {
    let db = setup().await;
    let repo = SurrealInventoryRepository::new(db);

    let mut garden = new_item("GRD-001", 10, 2);
    garden.category = "garden".into();
    repo.create(garden).await.unwrap();
    repo.create(new_item("PWR-001", 10, 2)).await.unwrap();

    let filtered = repo
        .list(
            InventoryFilter {
                category: Some("garden".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.items[0].sku, "GRD-001");
}
