//! Portfolio Rebalancer Core: domain models, error types and the
//! repository traits the account workflow is written against.

pub mod error;
pub mod models;
pub mod repository;
