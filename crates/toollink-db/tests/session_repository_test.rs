//! Integration tests for the Session repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_core::ToolLinkError;
use toollink_core::models::session::CreateSession;
use toollink_core::repository::SessionRepository;
use toollink_db::repository::SurrealSessionRepository;
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();
    db
}

fn new_session(token_hash: &str, ttl_secs: i64) -> CreateSession {
    CreateSession {
        user_id: Uuid::new_v4(),
        token_hash: token_hash.into(),
        ip_address: None,
        user_agent: None,
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
    }
}

#[tokio::test]
async fn cleanup_removes_only_expired_sessions() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    repo.create(new_session("hash-dead", -60)).await.unwrap();
    repo.create(new_session("hash-live", 3600)).await.unwrap();

    let removed = repo.cleanup_expired().await.unwrap();
    assert_eq!(removed, 1);

    assert!(matches!(
        repo.get_by_token_hash("hash-dead").await,
        Err(ToolLinkError::NotFound { .. })
    ));
    assert!(repo.get_by_token_hash("hash-live").await.is_ok());
}

#[tokio::test]
async fn cleanup_on_an_empty_table_removes_nothing() {
    let db = setup().await;
    let repo = SurrealSessionRepository::new(db);

    assert_eq!(repo.cleanup_expired().await.unwrap(), 0);

    repo.create(new_session("hash-dead", -60)).await.unwrap();
    assert_eq!(repo.cleanup_expired().await.unwrap(), 1);
    assert_eq!(repo.cleanup_expired().await.unwrap(), 0);
}
