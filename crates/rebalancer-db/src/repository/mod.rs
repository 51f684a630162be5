//! SurrealDB repository implementations.

mod session;
mod token;
mod user;

pub use session::SurrealSessionRepository;
pub use token::SurrealTokenRepository;
pub use user::SurrealUserRepository;
