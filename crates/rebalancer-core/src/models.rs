//! Domain models for account authentication.

pub mod session;
pub mod token;
pub mod user;
