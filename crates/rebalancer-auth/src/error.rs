//! Authentication error types.

use rebalancer_core::error::RebalancerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token not found")]
    TokenNotFound,

    #[error("token has expired")]
    TokenExpired,

    #[error("mail delivery failed: {0}")]
    MailDelivery(String),

    #[error("mail delivery timed out after {0} ms")]
    MailTimeout(u64),

    #[error(transparent)]
    Store(#[from] RebalancerError),
}

impl AuthError {
    /// `true` when the presented token should be treated as invalid
    /// rather than as an infrastructure failure.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, AuthError::TokenNotFound | AuthError::TokenExpired)
    }
}
