//! Outbound mail: the dispatch abstraction, an SMTP sender, a logging
//! sender for local development, and the account email templates.

use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::error::AuthError;

/// A fully rendered message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail transport abstraction used by the auth workflow.
pub trait Mailer: Send + Sync {
    /// Deliver a message, or report why it could not be delivered.
    fn send(&self, email: OutboundEmail) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// SMTP relay connection details.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Per-command socket timeout, kept within the dispatch bound.
    pub timeout: Duration,
}

/// Sends mail through an authenticated SMTP relay.
///
/// `lettre`'s transport is blocking, so each send runs on the blocking
/// pool.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, AuthError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| AuthError::MailDelivery(format!("invalid from address: {e}")))?;

        let transport = SmtpTransport::relay(&settings.host)
            .map_err(|e| AuthError::MailDelivery(format!("SMTP transport: {e}")))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .port(settings.port)
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            transport,
            from,
            timeout: settings.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build(&self, email: &OutboundEmail) -> Result<Message, AuthError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AuthError::MailDelivery(format!("invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| AuthError::MailDelivery(format!("message build: {e}")))
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), AuthError> {
        let message = self.build(&email)?;
        let transport = self.transport.clone();

        let outcome = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| AuthError::MailDelivery(format!("send task: {e}")))?;

        match outcome {
            Ok(_) => {
                info!(to = %email.to, "Email sent");
                Ok(())
            }
            Err(e) => {
                warn!(to = %email.to, error = %e, "Failed to send email");
                Err(AuthError::MailDelivery(e.to_string()))
            }
        }
    }
}

/// Development sender that logs instead of delivering.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), AuthError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            text_len = email.text.len(),
            "Email delivery stubbed (log mailer)"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Email asking the owner of `to` to confirm the address.
pub fn verification_email(to: &str, url: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Verify your Portfolio Rebalancer email address".into(),
        text: format!(
            "Thanks for registering for PortfolioRebalancer.com. Click the following link \
             to verify your email address: {url}. This link will expire within 24 hours."
        ),
        html: format!(
            "<p>Thanks for registering for \
             <a href=https://www.portfoliorebalancer.com>PortfolioRebalancer.com</a>! </p>\
             <p> Click the following link to verify your email address: <br/>\
             <a href={url}>{url}</a></p>\
             <p>This link will expire within 24 hours.</p>"
        ),
    }
}

/// Email carrying a password-reset link.
pub fn password_reset_email(to: &str, url: &str) -> OutboundEmail {
    OutboundEmail {
        to: to.to_string(),
        subject: "Portfolio Rebalancer password reset".into(),
        text: format!(
            "Click the following link to reset your password: {url}. If you did not request \
             this password reset, ignore this email. The link will expire within 24 hours of \
             being sent."
        ),
        html: format!(
            "<p>Click the following link to reset your password: \
             <a href={url}>{url}</a> </p>\
             <p>If you did not request this password reset, ignore this email. \
             The link will expire within 24 hours of being sent.</p>"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_carries_link() {
        let url = "https://example.com/verify/abc";
        let email = verification_email("a@x.com", url);
        assert_eq!(email.to, "a@x.com");
        assert!(email.subject.contains("Verify"));
        assert!(email.text.contains(url));
        assert!(email.html.contains(&format!("<a href={url}>{url}</a>")));
        assert!(email.text.contains("24 hours"));
    }

    #[test]
    fn reset_email_carries_link() {
        let url = "http://localhost:3000/reset/abc";
        let email = password_reset_email("a@x.com", url);
        assert!(email.subject.contains("password reset"));
        assert!(email.text.contains(url));
        assert!(email.html.contains(url));
    }

    #[test]
    fn smtp_mailer_rejects_bad_from() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: "u".into(),
            password: "p".into(),
            timeout: Duration::from_secs(10),
        };
        assert!(SmtpMailer::new(&settings, "not an address").is_err());
        assert!(SmtpMailer::new(&settings, "Rebalancer <noreply@example.com>").is_ok());
    }

    #[test]
    fn smtp_mailer_carries_transport_timeout() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: "u".into(),
            password: "p".into(),
            timeout: Duration::from_millis(750),
        };
        let mailer = SmtpMailer::new(&settings, "noreply@example.com").unwrap();
        assert_eq!(mailer.timeout(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        LogMailer
            .send(verification_email("a@x.com", "http://h/verify/t"))
            .await
            .unwrap();
    }
}
