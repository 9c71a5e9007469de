//! Integration tests for the User repository using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_core::ToolLinkError;
use toollink_core::models::user::{ApprovalStatus, CreateUser, UpdateUser};
use toollink_core::rbac::Role;
use toollink_core::repository::{Pagination, UserFilter, UserRepository};
use toollink_db::repository::SurrealUserRepository;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(username: &str, email: &str, role: Role) -> CreateUser {
    CreateUser {
        username: username.into(),
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        full_name: "Test User".into(),
        phone: None,
        role,
        approval_status: ApprovalStatus::Pending,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("alice", "alice@example.com", Role::Customer))
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, Role::Customer);
    assert_eq!(user.approval_status, ApprovalStatus::Pending);
    assert!(user.is_active);
    assert_eq!(user.failed_login_attempts, 0);
    assert!(user.deleted_at.is_none());

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn get_user_by_email_and_username() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("bob", "bob@example.com", Role::Cashier))
        .await
        .unwrap();

    let by_email = repo.get_by_email("bob@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);

    let by_username = repo.get_by_username("bob").await.unwrap();
    assert_eq!(by_username.id, user.id);
}

#[tokio::test]
async fn duplicate_email_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("user-a", "same@example.com", Role::Customer))
        .await
        .unwrap();

    let result = repo
        .create(new_user("user-b", "same@example.com", Role::Customer))
        .await;

    assert!(matches!(
        result,
        Err(ToolLinkError::DuplicateIdentity { .. })
    ));
}

#[tokio::test]
async fn duplicate_username_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user("unique", "first@example.com", Role::Customer))
        .await
        .unwrap();

    let result = repo
        .create(new_user("unique", "second@example.com", Role::Customer))
        .await;

    assert!(matches!(
        result,
        Err(ToolLinkError::DuplicateIdentity { .. })
    ));
}

#[tokio::test]
async fn update_user_partial_fields() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("carol", "carol@example.com", Role::Customer))
        .await
        .unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                full_name: Some("Carol Jones".into()),
                approval_status: Some(ApprovalStatus::Active),
                phone: Some(Some("+1-555-0100".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.full_name, "Carol Jones");
    assert_eq!(updated.approval_status, ApprovalStatus::Active);
    assert_eq!(updated.phone.as_deref(), Some("+1-555-0100"));
    assert_eq!(updated.email, "carol@example.com"); // unchanged
}

#[tokio::test]
async fn clearing_phone_with_explicit_none() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("dave", "dave@example.com", Role::Driver))
        .await
        .unwrap();

    repo.update(
        user.id,
        UpdateUser {
            phone: Some(Some("+1-555-0199".into())),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let cleared = repo
        .update(
            user.id,
            UpdateUser {
                phone: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(cleared.phone.is_none());
}

#[tokio::test]
async fn soft_delete_is_idempotent() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("eve", "eve@example.com", Role::Customer))
        .await
        .unwrap();

    repo.soft_delete(user.id).await.unwrap();
    let deleted = repo.get_by_id(user.id).await.unwrap();
    assert!(!deleted.is_active);
    assert!(deleted.deleted_at.is_some());
    let first_stamp = deleted.deleted_at;

    // Repeating is a no-op; the original deletion stamp survives.
    repo.soft_delete(user.id).await.unwrap();
    let again = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(again.deleted_at, first_stamp);
}

#[tokio::test]
async fn hard_delete_requires_prior_soft_delete() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(new_user("frank", "frank@example.com", Role::Customer))
        .await
        .unwrap();

    let premature = repo.hard_delete(user.id).await;
    assert!(matches!(premature, Err(ToolLinkError::Conflict { .. })));

    repo.soft_delete(user.id).await.unwrap();
    repo.hard_delete(user.id).await.unwrap();

    let gone = repo.get_by_id(user.id).await;
    assert!(matches!(gone, Err(ToolLinkError::NotFound { .. })));
}

#[tokio::test]
async fn list_users_with_filters_and_pagination() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..5 {
        repo.create(new_user(
            &format!("customer-{i}"),
            &format!("customer-{i}@example.com"),
            Role::Customer,
        ))
        .await
        .unwrap();
    }
    repo.create(new_user("staff", "staff@example.com", Role::Warehouse))
        .await
        .unwrap();

    let page1 = repo
        .list(
            UserFilter {
                role: Some(Role::Customer),
                ..Default::default()
            },
            Pagination { page: 1, limit: 3 },
        )
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);
    assert_eq!(page1.total_pages(), 2);

    let page2 = repo
        .list(
            UserFilter {
                role: Some(Role::Customer),
                ..Default::default()
            },
            Pagination { page: 2, limit: 3 },
        )
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);

    let everyone = repo
        .list(UserFilter::default(), Pagination { page: 1, limit: 20 })
        .await
        .unwrap();
    assert_eq!(everyone.total, 6);
}

#[tokio::test]
async fn active_only_filter_hides_soft_deleted() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let keep = repo
        .create(new_user("keeper", "keeper@example.com", Role::Customer))
        .await
        .unwrap();
    let drop = repo
        .create(new_user("dropper", "dropper@example.com", Role::Customer))
        .await
        .unwrap();
    repo.soft_delete(drop.id).await.unwrap();

    let visible = repo
        .list(
            UserFilter {
                active_only: true,
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    assert_eq!(visible.total, 1);
    assert_eq!(visible.items[0].id, keep.id);
}
