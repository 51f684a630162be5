//! Portfolio Rebalancer Database: SurrealDB connection management,
//! schema migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Credential hashing ([`hash_password`], [`verify_password`])
//! - Repositories for users, identity tokens and sessions
//! - Error types ([`DbError`])

mod connection;
mod credential;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use credential::{hash_password, verify_password};
pub use error::DbError;
pub use schema::run_migrations;
