//! Authentication configuration.

use std::time::Duration;

use chrono::TimeDelta;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Verification / reset token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// Session lifetime in seconds (default: 1_209_600 = 14 days).
    pub session_lifetime_secs: u64,
    /// Upper bound on a single mail dispatch (default: 10_000 ms).
    pub mail_timeout_millis: u64,
    /// `From` header for outbound mail.
    pub mail_from: String,
}

impl AuthConfig {
    pub fn token_lifetime(&self) -> TimeDelta {
        saturating_seconds(self.token_lifetime_secs)
    }

    pub fn session_lifetime(&self) -> TimeDelta {
        saturating_seconds(self.session_lifetime_secs)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_millis(self.mail_timeout_millis)
    }
}

/// Values past what `TimeDelta` can hold are capped at `TimeDelta::MAX`.
fn saturating_seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: 86_400,
            session_lifetime_secs: 1_209_600,
            mail_timeout_millis: 10_000,
            mail_from: "\"Portfolio Rebalancer\" <noreply@portfoliorebalancer.com>".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_token_lifetime_is_a_day() {
        assert_eq!(AuthConfig::default().token_lifetime(), TimeDelta::hours(24));
    }

    #[test]
    fn huge_lifetimes_saturate() {
        let config = AuthConfig {
            token_lifetime_secs: u64::MAX,
            session_lifetime_secs: i64::MAX as u64,
            ..AuthConfig::default()
        };
        assert_eq!(config.token_lifetime(), TimeDelta::MAX);
        assert_eq!(config.session_lifetime(), TimeDelta::MAX);
    }
}
