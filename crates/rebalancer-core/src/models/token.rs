//! Email-bound verification and password-reset tokens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which namespace a token lives in. The two kinds never share records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Verification,
    PasswordReset,
}

impl TokenKind {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            TokenKind::Verification => "verification_token",
            TokenKind::PasswordReset => "password_reset_token",
        }
    }

    /// Path segment used in emailed links (`/verify/{token}`, `/reset/{token}`).
    pub fn link_path(self) -> &'static str {
        match self {
            TokenKind::Verification => "verify",
            TokenKind::PasswordReset => "reset",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Verification => f.write_str("verification"),
            TokenKind::PasswordReset => f.write_str("password_reset"),
        }
    }
}

/// The single live token for one `(kind, email)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityToken {
    pub id: String,
    pub kind: TokenKind,
    pub email: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Create-or-refresh input. An existing record for the same
/// `(kind, email)` has its value and timestamp overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertToken {
    pub kind: TokenKind,
    pub email: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}
