//! Opaque session secrets.
//!
//! The client receives a random secret once; only its SHA-256 hash is
//! persisted, so a leaked session table cannot be replayed.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A session established by login, registration or verification.
#[derive(Clone)]
pub struct IssuedSession {
    pub session_id: Uuid,
    pub email: String,
    /// Raw secret for the client (cookie value). Not stored.
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSession")
            .field("session_id", &self.session_id)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Generate a cryptographically random session secret
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_session_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw session secret, hex-encoded.
///
/// This is the value stored as `session.token_hash`.
pub fn hash_session_secret(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
