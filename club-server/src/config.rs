use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Name of the redb database file inside the working directory
const DATABASE_FILE: &str = "membership.redb";

/// Server configuration for the membership daemon
///
/// # Environment variables
///
/// Every field can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/club/server | Working directory for database and logs |
/// | ENVIRONMENT | development | Runtime environment |
/// | TIMEZONE | Asia/Seoul | Timezone for fee calendars and day counters |
/// | DEFAULT_FEE | 200000 | Fallback fee when a year has no fee configuration |
/// | LOG_LEVEL | info | Log filter used when RUST_LOG is unset |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/club TIMEZONE=Asia/Seoul cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Timezone deciding calendar days for application numbers and deadlines
    pub timezone: Tz,
    /// Fallback fee amount for years without an explicit fee configuration
    pub default_fee: Decimal,
    /// Log filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/club/server".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Asia::Seoul),
            default_fee: std::env::var("DEFAULT_FEE")
                .ok()
                .and_then(|f| f.parse().ok())
                .unwrap_or_else(|| Decimal::from(200_000)),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// Override the working directory and timezone
    ///
    /// Mostly used by tests
    pub fn with_overrides(work_dir: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.timezone = timezone;
        config
    }

    /// Path of the membership database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(DATABASE_FILE)
    }

    /// Directory receiving rotating log files
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Whether running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
