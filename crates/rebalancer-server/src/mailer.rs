//! Mail transport chosen at startup.

use rebalancer_auth::{AuthError, LogMailer, Mailer, OutboundEmail, SmtpMailer, SmtpSettings};

/// SMTP when a relay is configured, otherwise the logging sender.
#[derive(Clone)]
pub enum AppMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl AppMailer {
    pub fn from_settings(settings: Option<&SmtpSettings>, from: &str) -> Result<Self, AuthError> {
        match settings {
            Some(settings) => Ok(Self::Smtp(SmtpMailer::new(settings, from)?)),
            None => Ok(Self::Log(LogMailer)),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Log(_) => "log",
        }
    }
}

impl Mailer for AppMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), AuthError> {
        match self {
            Self::Smtp(mailer) => mailer.send(email).await,
            Self::Log(mailer) => mailer.send(email).await,
        }
    }
}
