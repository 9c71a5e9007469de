//! Authentication service — registration, login, refresh rotation,
//! and the approval state machine.

use chrono::{Duration, Utc};
use toollink_core::error::{ToolLinkError, ToolLinkResult};
use toollink_core::models::activity::{ActivityAction, ActivityOutcome, CreateActivity};
use toollink_core::models::session::CreateSession;
use toollink_core::models::user::{ApprovalStatus, CreateUser, UpdateUser, User, UserProfile};
use toollink_core::rbac::Role;
use toollink_core::repository::{ActivityLogRepository, SessionRepository, UserRepository};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
    /// Self-registered accounts become pending customers;
    /// administratively provisioned accounts are active immediately.
    pub self_service: bool,
    pub ip_address: Option<String>,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    /// Email (preferred) or username.
    pub identifier: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (returned to the client, never stored).
    pub refresh_token: String,
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Sanitized user projection — never the password hash.
    pub user: UserProfile,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful refresh result (new token pair).
#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: Uuid,
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U, S, A> {
    user_repo: U,
    session_repo: S,
    activity_repo: A,
    config: AuthConfig,
}

impl<U, S, A> AuthService<U, S, A>
where
    U: UserRepository,
    S: SessionRepository,
    A: ActivityLogRepository,
{
    pub fn new(user_repo: U, session_repo: S, activity_repo: A, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            activity_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Append an activity entry; audit failures are logged, never
    /// propagated.
    async fn record(&self, entry: CreateActivity) {
        if let Err(e) = self.activity_repo.append(entry).await {
            tracing::warn!(error = %e, "failed to append activity entry");
        }
    }

    /// Register a new user. Uniqueness violations surface as
    /// `DuplicateIdentity`.
    pub async fn register(&self, input: RegisterInput) -> ToolLinkResult<User> {
        if input.username.trim().is_empty() {
            return Err(ToolLinkError::Validation {
                message: "username is required".into(),
            });
        }
        if !input.email.contains('@') {
            return Err(ToolLinkError::Validation {
                message: "email is not valid".into(),
            });
        }
        if input.password.len() < self.config.min_password_length {
            return Err(AuthError::PasswordPolicy(self.config.min_password_length).into());
        }

        let (role, approval_status) = if input.self_service {
            (Role::Customer, ApprovalStatus::Pending)
        } else {
            (input.role.unwrap_or(Role::Customer), ApprovalStatus::Active)
        };

        let password_hash = password::hash_password(&input.password, self.config.pepper.as_deref())
            .map_err(ToolLinkError::from)?;

        let user = self
            .user_repo
            .create(CreateUser {
                username: input.username,
                email: input.email,
                password_hash,
                full_name: input.full_name,
                phone: input.phone,
                role,
                approval_status,
            })
            .await?;

        self.record(CreateActivity {
            ip_address: input.ip_address,
            ..CreateActivity::success(Some(user.id), ActivityAction::UserRegistered, "user", user.id)
        })
        .await;

        Ok(user)
    }

    /// Authenticate with email/username + password and issue a token
    /// pair. Unknown identifier and wrong password are deliberately
    /// indistinguishable to the caller.
    pub async fn login(&self, input: LoginInput) -> ToolLinkResult<LoginOutput> {
        // 1. Look up user — email first, then username.
        let user = match self.user_repo.get_by_email(&input.identifier).await {
            Ok(u) => u,
            Err(ToolLinkError::NotFound { .. }) => self
                .user_repo
                .get_by_username(&input.identifier)
                .await
                .map_err(|_| AuthError::InvalidCredentials)?,
            Err(e) => return Err(e),
        };

        // 2. Account state gates. Pending approval is reported before
        //    password verification — the outcome must not depend on
        //    password correctness.
        match user.approval_status {
            ApprovalStatus::Active => {}
            ApprovalStatus::Pending => return Err(AuthError::AccountPendingApproval.into()),
            ApprovalStatus::Rejected => return Err(AuthError::AccountRejected.into()),
        }
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        let now = Utc::now();
        if user.is_locked(now) {
            return Err(AuthError::AccountLocked.into());
        }

        // 3. Verify password.
        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(ToolLinkError::from)?;

        if !valid {
            self.note_failed_attempt(&user, input.ip_address.clone())
                .await;
            return Err(AuthError::InvalidCredentials.into());
        }

        // 4. Successful login bookkeeping.
        let user = self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    failed_login_attempts: Some(0),
                    locked_until: Some(None),
                    last_login_at: Some(now),
                    ..UpdateUser::default()
                },
            )
            .await?;

        // 5. Generate refresh token and create session. Sweep expired
        //    sessions while we are here so the table does not
        //    accumulate dead rows; a failed sweep never blocks login.
        match self.session_repo.cleanup_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "removed expired sessions"),
            Err(e) => tracing::warn!(error = %e, "failed to sweep expired sessions"),
        }

        let raw_refresh = token::generate_refresh_token();
        let token_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at = now + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash,
                ip_address: input.ip_address.clone(),
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue JWT access token.
        let access_token = token::issue_access_token(user.id, user.role, &self.config)
            .map_err(ToolLinkError::from)?;

        self.record(CreateActivity {
            ip_address: input.ip_address,
            ..CreateActivity::success(Some(user.id), ActivityAction::UserLoggedIn, "user", user.id)
        })
        .await;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
            user: user.into(),
        })
    }

    /// Bump the failed-attempt counter, arming the lockout window when
    /// it trips the configured threshold.
    async fn note_failed_attempt(&self, user: &User, ip_address: Option<String>) {
        let attempts = user.failed_login_attempts + 1;
        let locked_until = if attempts >= self.config.max_failed_login_attempts {
            Some(Utc::now() + Duration::seconds(self.config.lockout_duration_secs as i64))
        } else {
            None
        };

        let update = UpdateUser {
            failed_login_attempts: Some(attempts),
            locked_until: locked_until.map(Some),
            ..UpdateUser::default()
        };
        if let Err(e) = self.user_repo.update(user.id, update).await {
            tracing::warn!(error = %e, user_id = %user.id, "failed to record login failure");
        }

        self.record(CreateActivity {
            ip_address,
            outcome: ActivityOutcome::Failure,
            ..CreateActivity::success(Some(user.id), ActivityAction::LoginFailed, "user", user.id)
        })
        .await;
    }

    /// Rotate a refresh token: consume the old one, verify the user is
    /// still permitted to authenticate, and issue a new token pair.
    ///
    /// Each refresh token is single-use — the old session is
    /// invalidated before the new one is created, so a replayed token
    /// always fails.
    pub async fn refresh(&self, input: RefreshInput) -> ToolLinkResult<RefreshOutput> {
        // 1. Look up session by token hash.
        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                ToolLinkError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into()).into()
                }
                other => other,
            })?;

        // 2. Check session expiry.
        if session.expires_at <= Utc::now() {
            let _ = self.session_repo.invalidate(session.id).await;
            return Err(AuthError::TokenExpired.into());
        }

        // 3. Invalidate old session (single-use guarantee).
        self.session_repo.invalidate(session.id).await?;

        // 4. Verify the user may still authenticate.
        let user = self.user_repo.get_by_id(session.user_id).await?;
        match user.approval_status {
            ApprovalStatus::Active => {}
            ApprovalStatus::Pending => return Err(AuthError::AccountPendingApproval.into()),
            ApprovalStatus::Rejected => return Err(AuthError::AccountRejected.into()),
        }
        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }
        if user.is_locked(Utc::now()) {
            return Err(AuthError::AccountLocked.into());
        }

        // 5. Create new session with rotated refresh token.
        let raw_refresh = token::generate_refresh_token();
        let new_hash = token::hash_refresh_token(&raw_refresh);
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let new_session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: new_hash,
                ip_address: input.ip_address,
                user_agent: input.user_agent,
                expires_at,
            })
            .await?;

        // 6. Issue new access token.
        let access_token = token::issue_access_token(user.id, user.role, &self.config)
            .map_err(ToolLinkError::from)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: new_session.id,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// `Pending → Active`. Records the approver and timestamp.
    pub async fn approve(&self, user_id: Uuid, approver_id: Uuid) -> ToolLinkResult<User> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if user.approval_status != ApprovalStatus::Pending {
            return Err(ToolLinkError::Conflict {
                message: "user is not pending approval".into(),
            });
        }

        let user = self
            .user_repo
            .update(
                user_id,
                UpdateUser {
                    approval_status: Some(ApprovalStatus::Active),
                    approved_by: Some(approver_id),
                    approved_at: Some(Utc::now()),
                    ..UpdateUser::default()
                },
            )
            .await?;

        self.record(CreateActivity::success(
            Some(approver_id),
            ActivityAction::UserApproved,
            "user",
            user_id,
        ))
        .await;

        Ok(user)
    }

    /// `Pending → Rejected`. The record is kept (deactivated) so the
    /// audit trail survives.
    pub async fn reject(
        &self,
        user_id: Uuid,
        approver_id: Uuid,
        reason: Option<String>,
    ) -> ToolLinkResult<User> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if user.approval_status != ApprovalStatus::Pending {
            return Err(ToolLinkError::Conflict {
                message: "user is not pending approval".into(),
            });
        }

        let user = self
            .user_repo
            .update(
                user_id,
                UpdateUser {
                    approval_status: Some(ApprovalStatus::Rejected),
                    is_active: Some(false),
                    approved_by: Some(approver_id),
                    approved_at: Some(Utc::now()),
                    ..UpdateUser::default()
                },
            )
            .await?;

        self.record(CreateActivity {
            after: reason.map(|r| serde_json::json!({ "reason": r })),
            ..CreateActivity::success(
                Some(approver_id),
                ActivityAction::UserRejected,
                "user",
                user_id,
            )
        })
        .await;

        Ok(user)
    }

    /// Change a password after verifying the current one. All
    /// outstanding sessions are revoked.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ToolLinkResult<()> {
        if new_password.len() < self.config.min_password_length {
            return Err(AuthError::PasswordPolicy(self.config.min_password_length).into());
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let valid = password::verify_password(
            current_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(ToolLinkError::from)?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let password_hash = password::hash_password(new_password, self.config.pepper.as_deref())
            .map_err(ToolLinkError::from)?;
        self.user_repo
            .update(
                user_id,
                UpdateUser {
                    password_hash: Some(password_hash),
                    ..UpdateUser::default()
                },
            )
            .await?;

        self.session_repo.invalidate_user_sessions(user_id).await?;

        self.record(CreateActivity::success(
            Some(user_id),
            ActivityAction::PasswordChanged,
            "user",
            user_id,
        ))
        .await;

        Ok(())
    }

    /// Invalidate the session behind a refresh token. A token that no
    /// longer maps to a session is already logged out — not an error.
    pub async fn logout(&self, raw_refresh_token: &str) -> ToolLinkResult<()> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);
        match self.session_repo.get_by_token_hash(&token_hash).await {
            Ok(session) => self.session_repo.invalidate(session.id).await,
            Err(ToolLinkError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Revoke every outstanding session for a user.
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> ToolLinkResult<()> {
        self.session_repo.invalidate_user_sessions(user_id).await
    }
}
