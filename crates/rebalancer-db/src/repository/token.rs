//! SurrealDB implementation of [`TokenRepository`].
//!
//! Each [`TokenKind`] has its own table. Records are keyed by the hex
//! SHA-256 of the owning email, so `upsert` for an address that already
//! holds a token rewrites that record in place.

use chrono::{DateTime, Utc};
use rebalancer_core::error::RebalancerResult;
use rebalancer_core::models::token::{IdentityToken, TokenKind, UpsertToken};
use rebalancer_core::repository::TokenRepository;
use sha2::{Digest, Sha256};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TokenRow {
    email: String,
    value: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TokenRowWithId {
    record_id: String,
    email: String,
    value: String,
    created_at: DateTime<Utc>,
}

impl TokenRowWithId {
    fn into_token(self, kind: TokenKind) -> IdentityToken {
        IdentityToken {
            id: self.record_id,
            kind,
            email: self.email,
            value: self.value,
            created_at: self.created_at,
        }
    }
}

/// Record key for the token owned by `email`.
fn record_key(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

/// SurrealDB implementation of the token store.
#[derive(Clone)]
pub struct SurrealTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_where(
        &self,
        kind: TokenKind,
        field: &'static str,
        needle: &str,
    ) -> RebalancerResult<Option<IdentityToken>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM {} WHERE {field} = $needle LIMIT 1",
            kind.table()
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("needle", needle.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TokenRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_token(kind)))
    }
}

impl<C: Connection> TokenRepository for SurrealTokenRepository<C> {
    async fn find_by_value(
        &self,
        kind: TokenKind,
        value: &str,
    ) -> RebalancerResult<Option<IdentityToken>> {
        self.find_where(kind, "value", value).await
    }

    async fn find_by_email(
        &self,
        kind: TokenKind,
        email: &str,
    ) -> RebalancerResult<Option<IdentityToken>> {
        self.find_where(kind, "email", email).await
    }

    async fn upsert(&self, input: UpsertToken) -> RebalancerResult<IdentityToken> {
        let key = record_key(&input.email);
        let query = format!(
            "UPSERT type::record('{}', $key) SET \
             email = $email, \
             value = $value, \
             created_at = $created_at",
            input.kind.table()
        );

        let result = self
            .db
            .query(&query)
            .bind(("key", key.clone()))
            .bind(("email", input.email))
            .bind(("value", input.value))
            .bind(("created_at", input.created_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(input.kind.table(), e))?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: input.kind.table().into(),
            id: key.clone(),
        })?;

        Ok(IdentityToken {
            id: key,
            kind: input.kind,
            email: row.email,
            value: row.value,
            created_at: row.created_at,
        })
    }
}
