//! Workflow behaviour when the credential or session store fails.

use chrono::Utc;
use rebalancer_auth::config::AuthConfig;
use rebalancer_auth::mail::LogMailer;
use rebalancer_auth::outcome::{LoginOutcome, PasswordOutcome, RegisterOutcome};
use rebalancer_auth::service::AuthService;
use rebalancer_core::error::{RebalancerError, RebalancerResult};
use rebalancer_core::models::session::{CreateSession, Session};
use rebalancer_core::models::token::{TokenKind, UpsertToken};
use rebalancer_core::models::user::{CreateUser, UpdateUser, User};
use rebalancer_core::repository::{SessionRepository, TokenRepository, UserRepository};
use rebalancer_db::repository::{
    SurrealSessionRepository, SurrealTokenRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

// -----------------------------------------------------------------------
// Store doubles
// -----------------------------------------------------------------------

/// Session store that cannot write.
struct DownSessions;

impl SessionRepository for DownSessions {
    async fn create(&self, _input: CreateSession) -> RebalancerResult<Session> {
        Err(RebalancerError::Database("session store unavailable".into()))
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> RebalancerResult<Session> {
        Err(RebalancerError::NotFound {
            entity: "session".into(),
            id: token_hash.into(),
        })
    }

    async fn invalidate(&self, _id: Uuid) -> RebalancerResult<()> {
        Ok(())
    }

    async fn cleanup_expired(&self) -> RebalancerResult<u64> {
        Ok(0)
    }
}

/// Credential store that delegates to SurrealDB but can be told to fail
/// the password comparison or the save.
struct FlakyUsers {
    inner: SurrealUserRepository<Db>,
    fail_compare: bool,
    fail_update: bool,
}

impl FlakyUsers {
    fn new(db: Surreal<Db>) -> Self {
        Self {
            inner: SurrealUserRepository::new(db),
            fail_compare: false,
            fail_update: false,
        }
    }
}

impl UserRepository for FlakyUsers {
    async fn create(&self, input: CreateUser) -> RebalancerResult<User> {
        self.inner.create(input).await
    }

    async fn get_by_email(&self, email: &str) -> RebalancerResult<User> {
        self.inner.get_by_email(email).await
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> RebalancerResult<User> {
        if self.fail_update {
            return Err(RebalancerError::Database("write rejected".into()));
        }
        self.inner.update(id, input).await
    }

    async fn verify_password(&self, user: &User, password: &str) -> RebalancerResult<bool> {
        if self.fail_compare {
            return Err(RebalancerError::Crypto("malformed hash".into()));
        }
        self.inner.verify_password(user, password).await
    }
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

async fn db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rebalancer_db::run_migrations(&db).await.unwrap();
    db
}

async fn seed_user(db: &Surreal<Db>, email: &str, password: &str) {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            email: email.into(),
            password: password.into(),
        })
        .await
        .unwrap();
}

/// Whether `password` is still the stored credential for `email`.
async fn password_matches(db: &Surreal<Db>, email: &str, password: &str) -> bool {
    let users = SurrealUserRepository::new(db.clone());
    let user = users.get_by_email(email).await.unwrap();
    users.verify_password(&user, password).await.unwrap()
}

fn service_with<U: UserRepository, S: SessionRepository>(
    db: &Surreal<Db>,
    users: U,
    sessions: S,
) -> AuthService<U, SurrealTokenRepository<Db>, S, LogMailer> {
    AuthService::new(
        users,
        SurrealTokenRepository::new(db.clone()),
        sessions,
        LogMailer,
        AuthConfig::default(),
    )
}

// -----------------------------------------------------------------------
// Session establishment
// -----------------------------------------------------------------------

#[tokio::test]
async fn login_reports_failure_when_session_cannot_be_stored() {
    let db = db().await;
    seed_user(&db, "a@x.com", "pw1").await;
    let auth = service_with(&db, SurrealUserRepository::new(db.clone()), DownSessions);

    let outcome = auth.login("a@x.com", "pw1").await;

    assert!(matches!(outcome, LoginOutcome::Failure));
    assert_eq!(outcome.code(), "LOGIN_FAILURE");
    assert!(outcome.session().is_none());
}

#[tokio::test]
async fn wrong_password_is_still_not_found_when_sessions_are_down() {
    let db = db().await;
    seed_user(&db, "a@x.com", "pw1").await;
    let auth = service_with(&db, SurrealUserRepository::new(db.clone()), DownSessions);

    assert!(matches!(
        auth.login("a@x.com", "nope").await,
        LoginOutcome::NotFound
    ));
}

#[tokio::test]
async fn register_keeps_account_when_session_cannot_be_stored() {
    let db = db().await;
    let auth = service_with(&db, SurrealUserRepository::new(db.clone()), DownSessions);

    let outcome = auth.register("a@x.com", "pw1").await;

    assert!(matches!(outcome, RegisterOutcome::LoginFailure));
    assert_eq!(outcome.code(), "LOGIN_FAILURE");
    assert!(password_matches(&db, "a@x.com", "pw1").await);

    // The account exists, so a retry is a conflict rather than a second user.
    assert!(matches!(
        auth.register("a@x.com", "pw1").await,
        RegisterOutcome::Conflict
    ));
}

// -----------------------------------------------------------------------
// Credential replacement
// -----------------------------------------------------------------------

#[tokio::test]
async fn change_password_fails_when_comparison_errors() {
    let db = db().await;
    seed_user(&db, "a@x.com", "old").await;
    let users = FlakyUsers {
        fail_compare: true,
        ..FlakyUsers::new(db.clone())
    };
    let auth = service_with(&db, users, SurrealSessionRepository::new(db.clone()));

    let outcome = auth.change_password("a@x.com", "old", "new").await;

    assert_eq!(outcome, PasswordOutcome::Failure);
    assert_eq!(outcome.code(), "PASSWORD_RESET_FAILURE");
    assert!(password_matches(&db, "a@x.com", "old").await);
    assert!(!password_matches(&db, "a@x.com", "new").await);
}

#[tokio::test]
async fn change_password_fails_when_save_errors() {
    let db = db().await;
    seed_user(&db, "a@x.com", "old").await;
    let users = FlakyUsers {
        fail_update: true,
        ..FlakyUsers::new(db.clone())
    };
    let auth = service_with(&db, users, SurrealSessionRepository::new(db.clone()));

    assert_eq!(
        auth.change_password("a@x.com", "old", "new").await,
        PasswordOutcome::Failure
    );
    assert!(password_matches(&db, "a@x.com", "old").await);
    assert!(matches!(
        auth.login("a@x.com", "old").await,
        LoginOutcome::EmailNotVerified(_)
    ));
}

#[tokio::test]
async fn reset_password_fails_when_save_errors() {
    let db = db().await;
    seed_user(&db, "a@x.com", "old").await;
    SurrealTokenRepository::new(db.clone())
        .upsert(UpsertToken {
            kind: TokenKind::PasswordReset,
            email: "a@x.com".into(),
            value: "reset-token".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let users = FlakyUsers {
        fail_update: true,
        ..FlakyUsers::new(db.clone())
    };
    let auth = service_with(&db, users, SurrealSessionRepository::new(db.clone()));

    assert_eq!(
        auth.reset_password("reset-token", "new").await,
        PasswordOutcome::Failure
    );
    assert!(password_matches(&db, "a@x.com", "old").await);
}
