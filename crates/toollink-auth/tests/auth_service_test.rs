//! Integration tests for the authentication service, backed by the
//! in-memory SurrealDB repositories.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use toollink_auth::config::AuthConfig;
use toollink_auth::service::{AuthService, LoginInput, RefreshInput, RegisterInput};
use toollink_core::{AuthFailureKind, ToolLinkError};
use toollink_core::models::user::ApprovalStatus;
use toollink_core::rbac::Role;
use toollink_db::repository::{
    SurrealActivityLogRepository, SurrealSessionRepository, SurrealUserRepository,
};

type Service = AuthService<
    SurrealUserRepository<Db>,
    SurrealSessionRepository<Db>,
    SurrealActivityLogRepository<Db>,
>;

async fn setup() -> Service {
    setup_with_config(AuthConfig {
        jwt_secret: "test-secret".into(),
        ..AuthConfig::default()
    })
    .await
}

async fn setup_with_config(config: AuthConfig) -> Service {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();

    AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
        SurrealActivityLogRepository::new(db),
        config,
    )
}

fn registration(username: &str, email: &str) -> RegisterInput {
    RegisterInput {
        username: username.into(),
        email: email.into(),
        password: "correct horse battery".into(),
        full_name: "Test User".into(),
        phone: None,
        role: None,
        self_service: true,
        ip_address: None,
    }
}

fn login(identifier: &str, password: &str) -> LoginInput {
    LoginInput {
        identifier: identifier.into(),
        password: password.into(),
        ip_address: None,
        user_agent: None,
    }
}

#[tokio::test]
async fn self_registration_starts_pending() {
    let service = setup().await;

    let user = service
        .register(registration("alice", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(user.role, Role::Customer);
    assert_eq!(user.approval_status, ApprovalStatus::Pending);
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn provisioned_accounts_are_active_immediately() {
    let service = setup().await;

    let user = service
        .register(RegisterInput {
            role: Some(Role::Warehouse),
            self_service: false,
            ..registration("whstaff", "whstaff@example.com")
        })
        .await
        .unwrap();

    assert_eq!(user.role, Role::Warehouse);
    assert_eq!(user.approval_status, ApprovalStatus::Active);
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let service = setup().await;

    service
        .register(registration("bob", "bob@example.com"))
        .await
        .unwrap();

    let result = service
        .register(registration("bob2", "bob@example.com"))
        .await;
    assert!(matches!(
        result,
        Err(ToolLinkError::DuplicateIdentity { .. })
    ));
}

#[tokio::test]
async fn short_password_rejected_by_policy() {
    let service = setup().await;

    let result = service
        .register(RegisterInput {
            password: "short".into(),
            ..registration("carl", "carl@example.com")
        })
        .await;
    assert!(matches!(result, Err(ToolLinkError::Validation { .. })));
}

#[tokio::test]
async fn pending_login_fails_even_with_correct_password() {
    let service = setup().await;

    service
        .register(registration("carol", "carol@example.com"))
        .await
        .unwrap();

    let with_right_password = service
        .login(login("carol@example.com", "correct horse battery"))
        .await;
    let with_wrong_password = service
        .login(login("carol@example.com", "totally wrong"))
        .await;

    // Both fail, and both report the approval state, not the password.
    for result in [with_right_password, with_wrong_password] {
        match result {
            Err(ToolLinkError::AuthenticationFailed { kind, .. }) => {
                assert_eq!(kind, AuthFailureKind::AccountPending);
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn approve_then_login_succeeds() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("dave", "dave@example.com"))
        .await
        .unwrap();

    let approved = service.approve(user.id, admin_id).await.unwrap();
    assert_eq!(approved.approval_status, ApprovalStatus::Active);
    assert_eq!(approved.approved_by, Some(admin_id));
    assert!(approved.approved_at.is_some());

    let output = service
        .login(login("dave@example.com", "correct horse battery"))
        .await
        .unwrap();
    assert!(!output.access_token.is_empty());
    assert!(!output.refresh_token.is_empty());
    assert_eq!(output.user.id, user.id);

    // Username works as the identifier too.
    service
        .login(login("dave", "correct horse battery"))
        .await
        .unwrap();
}

#[tokio::test]
async fn approval_is_single_shot() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("erin", "erin@example.com"))
        .await
        .unwrap();

    service.approve(user.id, admin_id).await.unwrap();
    let twice = service.approve(user.id, admin_id).await;
    assert!(matches!(twice, Err(ToolLinkError::Conflict { .. })));
}

#[tokio::test]
async fn rejected_accounts_cannot_log_in() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("frank", "frank@example.com"))
        .await
        .unwrap();

    let rejected = service
        .reject(user.id, admin_id, Some("unverifiable details".into()))
        .await
        .unwrap();
    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
    assert!(!rejected.is_active);

    let result = service
        .login(login("frank@example.com", "correct horse battery"))
        .await;
    assert!(matches!(
        result,
        Err(ToolLinkError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn unknown_identifier_reads_as_invalid_credentials() {
    let service = setup().await;

    let result = service.login(login("ghost@example.com", "whatever")).await;
    match result {
        Err(ToolLinkError::AuthenticationFailed { kind, .. }) => {
            assert_eq!(kind, AuthFailureKind::InvalidCredentials);
        }
        other => panic!("expected authentication failure, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let service = setup_with_config(AuthConfig {
        jwt_secret: "test-secret".into(),
        max_failed_login_attempts: 3,
        ..AuthConfig::default()
    })
    .await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("grace", "grace@example.com"))
        .await
        .unwrap();
    service.approve(user.id, admin_id).await.unwrap();

    for _ in 0..3 {
        let _ = service.login(login("grace@example.com", "wrong")).await;
    }

    // Even the correct password bounces off the lockout.
    let result = service
        .login(login("grace@example.com", "correct horse battery"))
        .await;
    match result {
        Err(ToolLinkError::AuthenticationFailed { kind, .. }) => {
            assert_eq!(kind, AuthFailureKind::AccountLocked);
        }
        other => panic!("expected lockout, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_rotates_and_old_token_is_dead() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("henry", "henry@example.com"))
        .await
        .unwrap();
    service.approve(user.id, admin_id).await.unwrap();

    let session = service
        .login(login("henry@example.com", "correct horse battery"))
        .await
        .unwrap();

    let rotated = service
        .refresh(RefreshInput {
            raw_refresh_token: session.refresh_token.clone(),
            ip_address: None,
            user_agent: None,
        })
        .await
        .unwrap();
    assert_ne!(rotated.refresh_token, session.refresh_token);
    assert_ne!(rotated.session_id, session.session_id);

    // Replay of the consumed token fails.
    let replay = service
        .refresh(RefreshInput {
            raw_refresh_token: session.refresh_token,
            ip_address: None,
            user_agent: None,
        })
        .await;
    assert!(matches!(
        replay,
        Err(ToolLinkError::AuthenticationFailed { .. })
    ));

    // The rotated token still works.
    service
        .refresh(RefreshInput {
            raw_refresh_token: rotated.refresh_token,
            ip_address: None,
            user_agent: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn change_password_revokes_sessions() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("iris", "iris@example.com"))
        .await
        .unwrap();
    service.approve(user.id, admin_id).await.unwrap();

    let session = service
        .login(login("iris@example.com", "correct horse battery"))
        .await
        .unwrap();

    service
        .change_password(user.id, "correct horse battery", "an even longer phrase")
        .await
        .unwrap();

    // Old refresh token was revoked along with the session.
    let replay = service
        .refresh(RefreshInput {
            raw_refresh_token: session.refresh_token,
            ip_address: None,
            user_agent: None,
        })
        .await;
    assert!(replay.is_err());

    // Old password no longer works, new one does.
    assert!(
        service
            .login(login("iris@example.com", "correct horse battery"))
            .await
            .is_err()
    );
    service
        .login(login("iris@example.com", "an even longer phrase"))
        .await
        .unwrap();
}

#[tokio::test]
async fn logout_is_idempotent() {
    let service = setup().await;
    let admin_id = uuid::Uuid::new_v4();

    let user = service
        .register(registration("jack", "jack@example.com"))
        .await
        .unwrap();
    service.approve(user.id, admin_id).await.unwrap();

    let session = service
        .login(login("jack@example.com", "correct horse battery"))
        .await
        .unwrap();

    service.logout(&session.refresh_token).await.unwrap();
    // A second logout with the same token is a silent no-op.
    service.logout(&session.refresh_token).await.unwrap();

    let replay = service
        .refresh(RefreshInput {
            raw_refresh_token: session.refresh_token,
            ip_address: None,
            user_agent: None,
        })
        .await;
    assert!(replay.is_err());
}

#[tokio::test]
async fn login_sweeps_expired_sessions() {
    use toollink_auth::token;
    use toollink_core::repository::SessionRepository;

    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    toollink_db::run_migrations(&db).await.unwrap();

    let sessions = SurrealSessionRepository::new(db.clone());
    let service = AuthService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealSessionRepository::new(db.clone()),
        SurrealActivityLogRepository::new(db),
        AuthConfig {
            jwt_secret: "test-secret".into(),
            refresh_token_lifetime_secs: 0,
            ..AuthConfig::default()
        },
    );

    let admin_id = uuid::Uuid::new_v4();
    let user = service
        .register(registration("ivy", "ivy@example.com"))
        .await
        .unwrap();
    service.approve(user.id, admin_id).await.unwrap();

    // Zero refresh lifetime: the session is dead the moment it exists.
    let first = service
        .login(login("ivy@example.com", "correct horse battery"))
        .await
        .unwrap();
    let first_hash = token::hash_refresh_token(&first.refresh_token);
    assert!(sessions.get_by_token_hash(&first_hash).await.is_ok());

    // The next login sweeps the dead row.
    service
        .login(login("ivy@example.com", "correct horse battery"))
        .await
        .unwrap();
    assert!(matches!(
        sessions.get_by_token_hash(&first_hash).await,
        Err(ToolLinkError::NotFound { .. })
    ));
}
