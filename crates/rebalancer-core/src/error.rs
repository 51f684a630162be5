//! Error types shared by the account crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RebalancerError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl RebalancerError {
    /// `true` for lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type RebalancerResult<T> = Result<T, RebalancerError>;
