use stringline_api::config::{DEFAULT_MAX_UPLOAD_BYTES, ServiceConfig};
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub upload_dir: String,
    pub static_dir: Option<String>,
    /// Seconds between automation sweeps, 0 disables the ticker
    pub automation_interval_secs: u64,
    /// Create missing tables on startup
    pub auto_migrate: bool,
    pub sentry_dsn: Option<String>,
    pub service: ServiceConfig,
}

fn non_empty(key: &'static str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    non_empty(key).ok_or(ConfigError::MissingVar(key))
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < 16 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET (at least 16 characters)".to_string(),
            ));
        }

        let defaults = ServiceConfig::default();
        let service = ServiceConfig {
            overdue_hours: parsed("OVERDUE_HOURS", defaults.overdue_hours)?,
            renewal_window_days: parsed("RENEWAL_WINDOW_DAYS", defaults.renewal_window_days)?,
            renewal_discount_percent: parsed(
                "RENEWAL_DISCOUNT_PERCENT",
                defaults.renewal_discount_percent,
            )?,
            turnaround_hours: parsed("TURNAROUND_HOURS", defaults.turnaround_hours)?,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl_hours: parsed("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            gateway_secret: non_empty("GATEWAY_SECRET"),
            cron_secret: non_empty("CRON_SECRET"),
        };
        if !(0..=100).contains(&service.renewal_discount_percent) {
            return Err(ConfigError::InvalidValue(
                "RENEWAL_DISCOUNT_PERCENT".to_string(),
            ));
        }

        Ok(Config {
            port: parsed("PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            session_secret,
            upload_dir: non_empty("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()),
            static_dir: non_empty("STATIC_DIR"),
            automation_interval_secs: parsed("AUTOMATION_INTERVAL_SECS", 900)?,
            auto_migrate: non_empty("AUTO_MIGRATE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            sentry_dsn: non_empty("SENTRY_DSN"),
            service,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_env_with_defaults_and_validation() {
        let keys = [
            "DATABASE_URL",
            "SESSION_SECRET",
            "PORT",
            "OVERDUE_HOURS",
            "GATEWAY_SECRET",
            "AUTOMATION_INTERVAL_SECS",
            "RENEWAL_DISCOUNT_PERCENT",
        ];
        // SAFETY: this is the only test in the binary that touches the environment
        unsafe {
            for key in keys {
                env::remove_var(key);
            }
        }

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar("SESSION_SECRET"))
        ));

        unsafe {
            env::set_var("SESSION_SECRET", "a-long-enough-session-secret");
            env::set_var("DATABASE_URL", "postgres://app:pw@localhost/stringline");
            env::set_var("GATEWAY_SECRET", "  ");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.automation_interval_secs, 900);
        assert_eq!(config.upload_dir, "./uploads");
        assert_eq!(config.service.overdue_hours, 72);
        assert_eq!(config.service.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.service.gateway_secret.is_none());

        unsafe {
            env::set_var("PORT", "9090");
            env::set_var("OVERDUE_HOURS", "24");
            env::set_var("AUTOMATION_INTERVAL_SECS", "0");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.service.overdue_hours, 24);
        assert_eq!(config.automation_interval_secs, 0);

        unsafe {
            env::set_var("PORT", "eighty");
        }
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue(key)) if key == "PORT"
        ));

        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("RENEWAL_DISCOUNT_PERCENT", "150");
        }
        assert!(Config::from_env().is_err());

        unsafe {
            for key in keys {
                env::remove_var(key);
            }
        }
    }
}
