//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings; identity tokens
//! use the hex SHA-256 of their email as record key so that a second
//! issuance for the same address lands on the same record.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "accounts_tokens_sessions",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD verified ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Identity tokens (one live record per email, keyed by email digest)
-- =======================================================================
DEFINE TABLE verification_token SCHEMAFULL;
DEFINE FIELD email ON TABLE verification_token TYPE string;
DEFINE FIELD value ON TABLE verification_token TYPE string;
DEFINE FIELD created_at ON TABLE verification_token TYPE datetime;
DEFINE INDEX idx_verification_token_value ON TABLE verification_token \
    COLUMNS value;
DEFINE INDEX idx_verification_token_email ON TABLE verification_token \
    COLUMNS email UNIQUE;

DEFINE TABLE password_reset_token SCHEMAFULL;
DEFINE FIELD email ON TABLE password_reset_token TYPE string;
DEFINE FIELD value ON TABLE password_reset_token TYPE string;
DEFINE FIELD created_at ON TABLE password_reset_token TYPE datetime;
DEFINE INDEX idx_password_reset_token_value ON TABLE password_reset_token \
    COLUMNS value;
DEFINE INDEX idx_password_reset_token_email ON TABLE password_reset_token \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;
";

// -----------------------------------------------------------------------
// Runner
// -----------------------------------------------------------------------

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<AppliedVersion> = result.take(0)?;
    Ok(rows.first().map(|r| r.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("recording v{} failed: {e}", migration.version))
        })?;

    Ok(())
}

/// Bring the schema up to date.
///
/// Creates the `_migration` tracking table on first run, then applies
/// every migration newer than the highest recorded version. Returns
/// how many migrations were applied; re-running on a current schema
/// applies none.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(db, migration).await?;
        applied += 1;
    }

    if applied == 0 {
        debug!(version = current, "Schema already current");
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use rebalancer_core::models::token::TokenKind;

    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn every_token_kind_has_a_table() {
        for kind in [TokenKind::Verification, TokenKind::PasswordReset] {
            let ddl = format!("DEFINE TABLE {} SCHEMAFULL", kind.table());
            assert!(SCHEMA_V1.contains(&ddl), "missing table for {kind}");
        }
    }

    #[test]
    fn user_email_is_unique() {
        assert!(SCHEMA_V1.contains("idx_user_email ON TABLE user COLUMNS email UNIQUE"));
    }
}
