//! Command-line and environment configuration for the server binary.

use std::time::Duration;

use clap::Parser;
use rebalancer_auth::{AuthConfig, SmtpSettings};
use rebalancer_db::DbConfig;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "rebalancer",
    about = "Portfolio Rebalancer account service",
    version
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "REBALANCER_PORT", default_value_t = 3000)]
    pub port: u16,

    /// SurrealDB endpoint, e.g. `ws://127.0.0.1:8000` or `mem://`
    #[arg(long, env = "REBALANCER_DB_URL", default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "REBALANCER_DB_NAMESPACE", default_value = "rebalancer")]
    pub db_namespace: String,

    #[arg(long, env = "REBALANCER_DB_DATABASE", default_value = "accounts")]
    pub db_database: String,

    #[arg(long, env = "REBALANCER_DB_USERNAME")]
    pub db_username: Option<String>,

    #[arg(long, env = "REBALANCER_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Secret mixed into every password hash
    #[arg(long, env = "REBALANCER_PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    /// SMTP relay host. Without it, mail is written to the log instead.
    #[arg(long, env = "REBALANCER_SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "REBALANCER_SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "REBALANCER_SMTP_USERNAME", default_value = "")]
    pub smtp_username: String,

    #[arg(
        long,
        env = "REBALANCER_SMTP_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub smtp_password: String,

    #[arg(long, env = "REBALANCER_MAIL_TIMEOUT_MS", default_value_t = 10_000)]
    pub mail_timeout_ms: u64,

    /// Scheme used in emailed links when no `X-Forwarded-Proto` is present
    #[arg(long, env = "REBALANCER_DEFAULT_SCHEME", default_value = "http")]
    pub default_scheme: String,

    /// Add `Secure` to the session cookie
    #[arg(long, env = "REBALANCER_SECURE_COOKIE")]
    pub secure_cookie: bool,
}

impl Args {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            mail_timeout_millis: self.mail_timeout_ms,
            ..AuthConfig::default()
        }
    }

    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        self.smtp_host.as_ref().map(|host| SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            timeout: Duration::from_millis(self.mail_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_surreal() {
        let args = Args::parse_from(["rebalancer"]);
        assert_eq!(args.port, 3000);
        assert_eq!(args.db_config().url, "ws://127.0.0.1:8000");
        assert_eq!(args.default_scheme, "http");
        assert!(args.smtp_settings().is_none());
        assert_eq!(args.auth_config().mail_timeout_millis, 10_000);
    }

    #[test]
    fn smtp_host_enables_relay() {
        let args = Args::parse_from([
            "rebalancer",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-port",
            "2525",
            "--mail-timeout-ms",
            "500",
        ]);
        let smtp = args.smtp_settings().unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.timeout, Duration::from_millis(500));
        assert_eq!(args.auth_config().mail_timeout_millis, 500);
        assert_eq!(args.auth_config().token_lifetime_secs, 86_400);
    }
}
