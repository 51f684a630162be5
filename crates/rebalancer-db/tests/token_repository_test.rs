//! Integration tests for the token store using in-memory SurrealDB.

use chrono::{Duration, Utc};
use rebalancer_core::models::token::{TokenKind, UpsertToken};
use rebalancer_core::repository::TokenRepository;
use rebalancer_db::repository::SurrealTokenRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealTokenRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rebalancer_db::run_migrations(&db).await.unwrap();
    SurrealTokenRepository::new(db)
}

fn token(kind: TokenKind, email: &str, value: &str) -> UpsertToken {
    UpsertToken {
        kind,
        email: email.into(),
        value: value.into(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn upsert_then_find() {
    let repo = setup().await;

    let stored = repo
        .upsert(token(TokenKind::Verification, "a@x.com", "v1"))
        .await
        .unwrap();
    assert_eq!(stored.email, "a@x.com");
    assert_eq!(stored.value, "v1");

    let by_value = repo
        .find_by_value(TokenKind::Verification, "v1")
        .await
        .unwrap()
        .expect("token by value");
    assert_eq!(by_value.email, "a@x.com");
    assert_eq!(by_value.id, stored.id);

    let by_email = repo
        .find_by_email(TokenKind::Verification, "a@x.com")
        .await
        .unwrap()
        .expect("token by email");
    assert_eq!(by_email.value, "v1");
}

#[tokio::test]
async fn upsert_overwrites_existing_record() {
    let repo = setup().await;
    let earlier = Utc::now() - Duration::hours(3);

    let first = repo
        .upsert(UpsertToken {
            created_at: earlier,
            ..token(TokenKind::Verification, "a@x.com", "v1")
        })
        .await
        .unwrap();
    let second = repo
        .upsert(token(TokenKind::Verification, "a@x.com", "v2"))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.created_at > earlier);
    assert!(
        repo.find_by_value(TokenKind::Verification, "v1")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.find_by_value(TokenKind::Verification, "v2")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn kinds_do_not_share_records() {
    let repo = setup().await;

    repo.upsert(token(TokenKind::Verification, "a@x.com", "shared"))
        .await
        .unwrap();

    assert!(
        repo.find_by_value(TokenKind::PasswordReset, "shared")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.find_by_email(TokenKind::PasswordReset, "a@x.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn unknown_value_is_none() {
    let repo = setup().await;

    assert!(
        repo.find_by_value(TokenKind::PasswordReset, "never-issued")
            .await
            .unwrap()
            .is_none()
    );
}
