//! Account workflow: login, registration, email verification and
//! password reset/change orchestration.
//!
//! Every public operation returns a value from [`crate::outcome`] and
//! never an error: store and transport failures are logged here and
//! collapsed into the operation's failure variant. Existence and
//! credential checks always run before any mutation.

use chrono::{DateTime, Utc};
use rebalancer_core::error::{RebalancerError, RebalancerResult};
use rebalancer_core::models::session::CreateSession;
use rebalancer_core::models::token::TokenKind;
use rebalancer_core::models::user::{CreateUser, UpdateUser, User};
use rebalancer_core::repository::{SessionRepository, TokenRepository, UserRepository};
use tracing::{error, info, instrument, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::mail::{self, Mailer, OutboundEmail};
use crate::outcome::{
    EmailAvailability, LoginOutcome, LogoutOutcome, PasswordOutcome, RegisterOutcome,
    SendPasswordResetOutcome, SendVerificationEmailOutcome, VerifyOutcome,
};
use crate::session::{self, IssuedSession};
use crate::token::TokenService;

/// Scheme and host the inbound request arrived on; emailed links point
/// back at the same origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// `{scheme}://{host}/verify/{token}` or `{scheme}://{host}/reset/{token}`.
    pub fn link(&self, kind: TokenKind, token: &str) -> String {
        format!(
            "{}://{}/{}/{}",
            self.scheme,
            self.host,
            kind.link_path(),
            token
        )
    }
}

/// Authentication workflow.
///
/// Generic over repository and mail implementations so that the auth
/// layer has no dependency on the database crate or a mail transport.
pub struct AuthService<U, T, S, M>
where
    U: UserRepository,
    T: TokenRepository,
    S: SessionRepository,
    M: Mailer,
{
    user_repo: U,
    tokens: TokenService<T>,
    session_repo: S,
    mailer: M,
    config: AuthConfig,
}

impl<U, T, S, M> AuthService<U, T, S, M>
where
    U: UserRepository,
    T: TokenRepository,
    S: SessionRepository,
    M: Mailer,
{
    pub fn new(user_repo: U, token_repo: T, session_repo: S, mailer: M, config: AuthConfig) -> Self {
        Self {
            user_repo,
            tokens: TokenService::new(token_repo, &config),
            session_repo,
            mailer,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Authenticate with email + password and establish a session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let user = match self.lookup(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return LoginOutcome::NotFound,
            Err(e) => {
                error!(error = %e, "User lookup failed during login");
                return LoginOutcome::NotFound;
            }
        };

        match self.user_repo.verify_password(&user, password).await {
            Ok(true) => {}
            Ok(false) => return LoginOutcome::NotFound,
            Err(e) => {
                error!(error = %e, "Credential comparison failed during login");
                return LoginOutcome::NotFound;
            }
        }

        let session = match self.establish_session(&user).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Could not establish session");
                return LoginOutcome::Failure;
            }
        };

        if user.verified {
            LoginOutcome::Success(session)
        } else {
            LoginOutcome::EmailNotVerified(session)
        }
    }

    /// Invalidate the session the presented secret belongs to, if any.
    #[instrument(skip_all)]
    pub async fn logout(&self, session_secret: &str) -> LogoutOutcome {
        let token_hash = session::hash_session_secret(session_secret);
        match self.session_repo.get_by_token_hash(&token_hash).await {
            Ok(session) => {
                if let Err(e) = self.session_repo.invalidate(session.id).await {
                    error!(error = %e, session_id = %session.id, "Session invalidation failed");
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => error!(error = %e, "Session lookup failed during logout"),
        }
        LogoutOutcome::Success
    }

    /// Remove expired sessions; returns how many were deleted.
    pub async fn purge_expired_sessions(&self) -> RebalancerResult<u64> {
        let purged = self.session_repo.cleanup_expired().await?;
        if purged > 0 {
            info!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }

    // -----------------------------------------------------------------------
    // Registration & verification
    // -----------------------------------------------------------------------

    /// Whether `email` is free to register. Lookup failures report
    /// [`EmailAvailability::Taken`].
    #[instrument(skip(self))]
    pub async fn is_email_available(&self, email: &str) -> EmailAvailability {
        match self.lookup(email).await {
            Ok(None) => EmailAvailability::Available,
            Ok(Some(_)) => EmailAvailability::Taken,
            Err(e) => {
                error!(error = %e, "User lookup failed during availability check");
                EmailAvailability::Taken
            }
        }
    }

    /// Create an unverified account and sign it in.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> RegisterOutcome {
        match self.lookup(email).await {
            Ok(Some(_)) => return RegisterOutcome::Conflict,
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "User lookup failed during registration");
                return RegisterOutcome::Failure;
            }
        }

        let user = match self
            .user_repo
            .create(CreateUser {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
        {
            Ok(user) => user,
            Err(RebalancerError::AlreadyExists { .. }) => {
                warn!("Concurrent registration won the race for this email");
                return RegisterOutcome::Failure;
            }
            Err(e) => {
                error!(error = %e, "Could not persist new user");
                return RegisterOutcome::Failure;
            }
        };

        info!(user_id = %user.id, "User registered");

        match self.establish_session(&user).await {
            Ok(session) => RegisterOutcome::LoginSuccess(session),
            Err(e) => {
                error!(error = %e, "Could not establish session after registration");
                RegisterOutcome::LoginFailure
            }
        }
    }

    /// Issue (or refresh) a verification token and mail the link.
    #[instrument(skip(self))]
    pub async fn send_verification_email(
        &self,
        origin: &RequestOrigin,
        email: &str,
    ) -> SendVerificationEmailOutcome {
        match self.lookup(email).await {
            Ok(Some(_)) => {}
            Ok(None) => return SendVerificationEmailOutcome::NotFound,
            Err(e) => {
                error!(error = %e, "User lookup failed before verification email");
                return SendVerificationEmailOutcome::Failure;
            }
        }

        let token = match self.tokens.issue(TokenKind::Verification, email).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Could not issue verification token");
                return SendVerificationEmailOutcome::Failure;
            }
        };

        let url = origin.link(TokenKind::Verification, &token);
        match self.dispatch(mail::verification_email(email, &url)).await {
            Ok(()) => SendVerificationEmailOutcome::Success,
            Err(e) => {
                error!(error = %e, "Verification email not sent");
                SendVerificationEmailOutcome::Failure
            }
        }
    }

    /// Mark the account bound to a verification token as verified and
    /// sign it in.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> VerifyOutcome {
        let email = match self.tokens.validate(TokenKind::Verification, token).await {
            Ok(email) => email,
            Err(e) if e.is_invalid_token() => {
                info!(reason = %e, "Rejected verification token");
                return VerifyOutcome::InvalidVerificationToken;
            }
            Err(e) => {
                error!(error = %e, "Verification token lookup failed");
                return VerifyOutcome::InvalidVerificationToken;
            }
        };

        let user = match self.lookup(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(email = %email, "Verification token outlived its user");
                return VerifyOutcome::Failure;
            }
            Err(e) => {
                error!(error = %e, "User lookup failed during verification");
                return VerifyOutcome::Failure;
            }
        };

        let user = if user.verified {
            user
        } else {
            match self
                .user_repo
                .update(
                    user.id,
                    UpdateUser {
                        verified: Some(true),
                        ..Default::default()
                    },
                )
                .await
            {
                Ok(user) => {
                    info!(user_id = %user.id, "Email address verified");
                    user
                }
                Err(e) => {
                    error!(error = %e, "Could not persist verified flag");
                    return VerifyOutcome::Failure;
                }
            }
        };

        match self.establish_session(&user).await {
            Ok(session) => VerifyOutcome::Success(session),
            Err(e) => {
                error!(error = %e, "Could not establish session after verification");
                VerifyOutcome::Failure
            }
        }
    }

    // -----------------------------------------------------------------------
    // Password reset & change
    // -----------------------------------------------------------------------

    /// Issue (or refresh) a password-reset token and mail the link.
    #[instrument(skip(self))]
    pub async fn send_password_reset(
        &self,
        origin: &RequestOrigin,
        email: &str,
    ) -> SendPasswordResetOutcome {
        match self.lookup(email).await {
            Ok(Some(_)) => {}
            Ok(None) => return SendPasswordResetOutcome::NotFound,
            Err(e) => {
                error!(error = %e, "User lookup failed before password reset email");
                return SendPasswordResetOutcome::Failure;
            }
        }

        let token = match self.tokens.issue(TokenKind::PasswordReset, email).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Could not issue password reset token");
                return SendPasswordResetOutcome::Failure;
            }
        };

        let url = origin.link(TokenKind::PasswordReset, &token);
        match self.dispatch(mail::password_reset_email(email, &url)).await {
            Ok(()) => SendPasswordResetOutcome::Success,
            Err(e) => {
                error!(error = %e, "Password reset email not sent");
                SendPasswordResetOutcome::Failure
            }
        }
    }

    /// Replace the credential after proving knowledge of the current one.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> PasswordOutcome {
        let user = match self.lookup(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return PasswordOutcome::UserNotFound,
            Err(e) => {
                error!(error = %e, "User lookup failed during password change");
                return PasswordOutcome::Failure;
            }
        };

        match self.user_repo.verify_password(&user, current_password).await {
            Ok(true) => {}
            Ok(false) => return PasswordOutcome::InvalidPassword,
            Err(e) => {
                error!(error = %e, "Credential comparison failed during password change");
                return PasswordOutcome::Failure;
            }
        }

        self.replace_password(&user, new_password).await
    }

    /// Replace the credential of the account bound to a reset token.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> PasswordOutcome {
        let email = match self.tokens.validate(TokenKind::PasswordReset, token).await {
            Ok(email) => email,
            Err(e) if e.is_invalid_token() => {
                info!(reason = %e, "Rejected password reset token");
                return PasswordOutcome::InvalidToken;
            }
            Err(e) => {
                error!(error = %e, "Password reset token lookup failed");
                return PasswordOutcome::Failure;
            }
        };

        let user = match self.lookup(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => return PasswordOutcome::UserNotFound,
            Err(e) => {
                error!(error = %e, "User lookup failed during password reset");
                return PasswordOutcome::Failure;
            }
        };

        self.replace_password(&user, new_password).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn lookup(&self, email: &str) -> RebalancerResult<Option<User>> {
        match self.user_repo.get_by_email(email).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn replace_password(&self, user: &User, new_password: &str) -> PasswordOutcome {
        match self
            .user_repo
            .update(
                user.id,
                UpdateUser {
                    password: Some(new_password.to_string()),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(_) => {
                info!(user_id = %user.id, "Password replaced");
                PasswordOutcome::Success
            }
            Err(e) => {
                error!(error = %e, "Could not persist new password");
                PasswordOutcome::Failure
            }
        }
    }

    async fn establish_session(&self, user: &User) -> RebalancerResult<IssuedSession> {
        let secret = session::generate_session_secret();
        let expires_at = Utc::now()
            .checked_add_signed(self.config.session_lifetime())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let stored = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: session::hash_session_secret(&secret),
                expires_at,
            })
            .await?;

        Ok(IssuedSession {
            session_id: stored.id,
            email: user.email.clone(),
            secret,
            expires_at: stored.expires_at,
        })
    }

    /// Send through the mailer, bounded by the configured timeout.
    async fn dispatch(&self, email: OutboundEmail) -> Result<(), AuthError> {
        let timeout = self.config.mail_timeout();
        match tokio::time::timeout(timeout, self.mailer.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::MailTimeout(self.config.mail_timeout_millis)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_follow_request_origin() {
        let origin = RequestOrigin::new("https", "www.portfoliorebalancer.com");
        assert_eq!(
            origin.link(TokenKind::Verification, "abc"),
            "https://www.portfoliorebalancer.com/verify/abc"
        );
        assert_eq!(
            origin.link(TokenKind::PasswordReset, "abc"),
            "https://www.portfoliorebalancer.com/reset/abc"
        );
    }

    #[test]
    fn link_keeps_port_in_host() {
        let origin = RequestOrigin::new("http", "localhost:3000");
        assert_eq!(
            origin.link(TokenKind::Verification, "t"),
            "http://localhost:3000/verify/t"
        );
    }
}
