//! Portfolio Rebalancer Auth: account registration, login, email
//! verification and password reset/change.
//!
//! [`TokenService`] owns the lifecycle of the email-bound, time-limited
//! tokens; [`AuthService`] drives the account state machine and answers
//! every request with one outcome from [`outcome`].

pub mod config;
pub mod error;
pub mod mail;
pub mod outcome;
pub mod service;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use mail::{LogMailer, Mailer, OutboundEmail, SmtpMailer, SmtpSettings};
pub use service::{AuthService, RequestOrigin};
pub use session::IssuedSession;
pub use token::TokenService;
