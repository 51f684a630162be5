//! Database-specific error types and conversions.

use rebalancer_core::error::RebalancerError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Credential hashing failed: {0}")]
    Credential(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

impl DbError {
    /// Classify a failed statement: unique-index violations become
    /// [`DbError::AlreadyExists`], everything else [`DbError::Query`].
    pub(crate) fn from_statement(entity: &str, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for RebalancerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RebalancerError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => RebalancerError::AlreadyExists { entity },
            DbError::Credential(msg) => RebalancerError::Crypto(msg),
            other => RebalancerError::Database(other.to_string()),
        }
    }
}
