use std::time::Duration;

use nimbus_core::AppConfig;

/// Idle-session monitoring settings, consumed by the host session monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub enabled: bool,
    /// Inactivity after which the session ends.
    pub idle_timeout: Duration,
    /// How long before the timeout the user is warned.
    pub warning_before: Duration,
    pub check_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_timeout: Duration::from_secs(30 * 60),
            warning_before: Duration::from_secs(2 * 60),
            check_interval: Duration::from_secs(30),
        }
    }
}

impl SessionOptions {
    /// Defaults overridden by `session.enabled`, `session.idle_timeout_secs`,
    /// `session.warning_before_secs` and `session.check_interval_secs`.
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            Duration::from_secs(config.get_or(key, default.as_secs()))
        };
        Self {
            enabled: config.get_or("session.enabled", defaults.enabled),
            idle_timeout: secs("session.idle_timeout_secs", defaults.idle_timeout),
            warning_before: secs("session.warning_before_secs", defaults.warning_before),
            check_interval: secs("session.check_interval_secs", defaults.check_interval),
        }
    }

    /// Point at which the idle warning is shown, measured from last activity.
    pub fn warning_after(&self) -> Duration {
        self.idle_timeout.saturating_sub(self.warning_before)
    }
}
