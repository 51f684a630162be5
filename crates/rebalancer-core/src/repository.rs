//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The auth workflow is generic
//! over these traits and never names a concrete store.

use uuid::Uuid;

use crate::error::RebalancerResult;
use crate::models::{
    session::{CreateSession, Session},
    token::{IdentityToken, TokenKind, UpsertToken},
    user::{CreateUser, UpdateUser, User},
};

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken, including when
    /// a concurrent registration wins the race.
    fn create(&self, input: CreateUser) -> impl Future<Output = RebalancerResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = RebalancerResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = RebalancerResult<User>> + Send;
    /// Compare a plaintext password against the stored credential.
    ///
    /// `Ok(false)` is a mismatch; `Err` means the comparison itself
    /// could not run (malformed hash, hasher failure).
    fn verify_password(
        &self,
        user: &User,
        password: &str,
    ) -> impl Future<Output = RebalancerResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

pub trait TokenRepository: Send + Sync {
    fn find_by_value(
        &self,
        kind: TokenKind,
        value: &str,
    ) -> impl Future<Output = RebalancerResult<Option<IdentityToken>>> + Send;
    fn find_by_email(
        &self,
        kind: TokenKind,
        email: &str,
    ) -> impl Future<Output = RebalancerResult<Option<IdentityToken>>> + Send;
    /// Insert the token, or overwrite value and timestamp of the one
    /// already held for `(kind, email)`.
    fn upsert(
        &self,
        input: UpsertToken,
    ) -> impl Future<Output = RebalancerResult<IdentityToken>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession)
    -> impl Future<Output = RebalancerResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = RebalancerResult<Session>> + Send;
    fn invalidate(&self, id: Uuid) -> impl Future<Output = RebalancerResult<()>> + Send;
    /// Delete expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> impl Future<Output = RebalancerResult<u64>> + Send;
}
