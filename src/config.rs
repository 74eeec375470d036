use std::env;
use std::time::Duration;

use crate::error::LogError;
use crate::severity::Severity;

/// Default file-roll threshold in bytes.
pub const DEFAULT_ROLL_SIZE: u64 = 500 * 1000 * 1000;

/// Default period of the writer's wake-up and the file's background flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);

/// Settings for an async logging pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Path prefix of the log files; the roll timestamp, hostname and pid are
    /// appended to it.
    pub basename: String,
    /// Bytes written to one file before rolling to the next.
    pub roll_size: u64,
    /// How long the consumer sleeps when idle and how often files are flushed.
    pub flush_interval: Duration,
    /// Records below this severity are never built.
    pub min_severity: Severity,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            basename: "app".to_string(),
            roll_size: DEFAULT_ROLL_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            min_severity: Severity::Info,
        }
    }
}

impl LoggerConfig {
    /// Reads overrides from `ASYNC_LOGGER_BASENAME`, `ASYNC_LOGGER_ROLL_SIZE`,
    /// `ASYNC_LOGGER_FLUSH_SECS` and `ASYNC_LOGGER_LEVEL`.
    ///
    /// Unparseable numbers fall back to the defaults; an unknown level name is
    /// an error.
    pub fn from_env() -> Result<Self, LogError> {
        let defaults = Self::default();

        let basename = env::var("ASYNC_LOGGER_BASENAME")
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.basename);
        let roll_size = env::var("ASYNC_LOGGER_ROLL_SIZE")
            .ok()
            .and_then(|size| size.trim().parse::<u64>().ok())
            .unwrap_or(defaults.roll_size);
        let flush_interval = env::var("ASYNC_LOGGER_FLUSH_SECS")
            .ok()
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.flush_interval);
        let min_severity = match env::var("ASYNC_LOGGER_LEVEL") {
            Ok(level) => level.parse()?,
            Err(_) => defaults.min_severity,
        };

        let config = Self {
            basename,
            roll_size,
            flush_interval,
            min_severity,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LogError> {
        if self.basename.trim().is_empty() {
            return Err(LogError::InvalidConfig(
                "basename cannot be empty".to_string(),
            ));
        }
        if self.roll_size == 0 {
            return Err(LogError::InvalidConfig(
                "roll size must be greater than 0".to_string(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(LogError::InvalidConfig(
                "flush interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
