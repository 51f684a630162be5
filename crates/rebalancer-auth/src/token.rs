//! Single-use, time-limited tokens bound to an email address.
//!
//! Two independent namespaces exist ([`TokenKind::Verification`] and
//! [`TokenKind::PasswordReset`]). Each `(kind, email)` holds at most one
//! live token: issuing again overwrites the value and timestamp, which
//! strands any link mailed earlier.

use chrono::{DateTime, SecondsFormat, Utc};
use rebalancer_core::models::token::{TokenKind, UpsertToken};
use rebalancer_core::repository::TokenRepository;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Derive a token value from the email and the issuance instant.
///
/// SHA-256 over `email || now` (nanosecond RFC 3339), hex-encoded. Not
/// reproducible without the exact issuance time, and distinct for
/// successive issuances to the same address.
pub fn derive_token_value(email: &str, now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(now.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
    hex::encode(hasher.finalize())
}

/// Issues and validates identity tokens. Identity-agnostic: whether the
/// email belongs to a user is the caller's concern.
pub struct TokenService<T: TokenRepository> {
    repo: T,
    lifetime: chrono::Duration,
}

impl<T: TokenRepository> TokenService<T> {
    pub fn new(repo: T, config: &AuthConfig) -> Self {
        Self {
            repo,
            lifetime: config.token_lifetime(),
        }
    }

    /// Create or refresh the token for `(kind, email)` and return its
    /// value for inclusion in a link.
    ///
    /// Concurrent issuance for one email is last-write-wins.
    pub async fn issue(&self, kind: TokenKind, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();

        match self.repo.find_by_email(kind, email).await? {
            Some(existing) => debug!(
                %kind,
                email = %email,
                previous_issued_at = %existing.created_at,
                "Refreshing token"
            ),
            None => debug!(%kind, email = %email, "Issuing new token"),
        }

        let token = self
            .repo
            .upsert(UpsertToken {
                kind,
                email: email.to_string(),
                value: derive_token_value(email, now),
                created_at: now,
            })
            .await?;

        Ok(token.value)
    }

    /// Resolve a presented token to the email it is bound to.
    ///
    /// Fails with [`AuthError::TokenNotFound`] for unknown values and
    /// [`AuthError::TokenExpired`] once the token is a full lifetime old.
    /// Validation does not consume the token.
    pub async fn validate(&self, kind: TokenKind, raw_token: &str) -> Result<String, AuthError> {
        let token = self
            .repo
            .find_by_value(kind, raw_token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let age = Utc::now() - token.created_at;
        if age >= self.lifetime {
            debug!(%kind, email = %token.email, age_secs = age.num_seconds(), "Token expired");
            return Err(AuthError::TokenExpired);
        }

        Ok(token.email)
    }
}
