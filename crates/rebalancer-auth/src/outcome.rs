//! The closed response vocabulary of the auth workflow.
//!
//! Every workflow call resolves to exactly one variant of its
//! operation's enum. [`code`](LoginOutcome::code) gives the wire name;
//! mapping to transport status codes is left to the transport.

use crate::session::IssuedSession;

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Unknown email, wrong password, or the lookup itself failed.
    NotFound,
    /// Credentials matched but the session could not be established.
    Failure,
    /// Credentials matched on an account that has not been verified.
    /// The session is still established.
    EmailNotVerified(IssuedSession),
    Success(IssuedSession),
}

impl LoginOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            LoginOutcome::NotFound => "LOGIN_NOT_FOUND",
            LoginOutcome::Failure => "LOGIN_FAILURE",
            LoginOutcome::EmailNotVerified(_) => "LOGIN_EMAIL_NOT_VERIFIED",
            LoginOutcome::Success(_) => "LOGIN_SUCCESS",
        }
    }

    pub fn session(&self) -> Option<&IssuedSession> {
        match self {
            LoginOutcome::EmailNotVerified(s) | LoginOutcome::Success(s) => Some(s),
            LoginOutcome::NotFound | LoginOutcome::Failure => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    Conflict,
    /// Persisting the user failed, including losing a registration race.
    Failure,
    /// The account exists but the session could not be established.
    LoginFailure,
    LoginSuccess(IssuedSession),
}

impl RegisterOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            RegisterOutcome::Conflict => "REGISTER_CONFLICT",
            RegisterOutcome::Failure => "REGISTER_FAILURE",
            RegisterOutcome::LoginFailure => "LOGIN_FAILURE",
            RegisterOutcome::LoginSuccess(_) => "LOGIN_SUCCESS",
        }
    }

    pub fn session(&self) -> Option<&IssuedSession> {
        match self {
            RegisterOutcome::LoginSuccess(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum VerifyOutcome {
    InvalidVerificationToken,
    Failure,
    Success(IssuedSession),
}

impl VerifyOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            VerifyOutcome::InvalidVerificationToken => "VERIFY_INVALID_VERIFICATION_TOKEN",
            VerifyOutcome::Failure => "VERIFY_FAILURE",
            VerifyOutcome::Success(_) => "VERIFY_SUCCESS",
        }
    }

    pub fn session(&self) -> Option<&IssuedSession> {
        match self {
            VerifyOutcome::Success(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendVerificationEmailOutcome {
    NotFound,
    Failure,
    Success,
}

impl SendVerificationEmailOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            SendVerificationEmailOutcome::NotFound => "SEND_VERIFICATION_EMAIL_NOT_FOUND",
            SendVerificationEmailOutcome::Failure => "SEND_VERIFICATION_EMAIL_FAILURE",
            SendVerificationEmailOutcome::Success => "SEND_VERIFICATION_EMAIL_SUCCESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPasswordResetOutcome {
    NotFound,
    Failure,
    Success,
}

impl SendPasswordResetOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            SendPasswordResetOutcome::NotFound => "SEND_PASSWORD_RESET_NOT_FOUND",
            SendPasswordResetOutcome::Failure => "SEND_PASSWORD_RESET_FAILURE",
            SendPasswordResetOutcome::Success => "SEND_PASSWORD_RESET_SUCCESS",
        }
    }
}

/// Shared by change-password (current credential) and reset-password
/// (emailed token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    UserNotFound,
    /// Reset link unknown or expired.
    InvalidToken,
    /// Current password did not match.
    InvalidPassword,
    Failure,
    Success,
}

impl PasswordOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            PasswordOutcome::UserNotFound => "PASSWORD_USER_NOT_FOUND",
            PasswordOutcome::InvalidToken => "PASSWORD_RESET_INVALID_TOKEN",
            PasswordOutcome::InvalidPassword => "PASSWORD_RESET_INVALID_PASSWORD",
            PasswordOutcome::Failure => "PASSWORD_RESET_FAILURE",
            PasswordOutcome::Success => "PASSWORD_RESET_SUCCESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailAvailability {
    Available,
    Taken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    Success,
}

impl LogoutOutcome {
    pub fn code(&self) -> &'static str {
        "LOGOUT_SUCCESS"
    }
}
