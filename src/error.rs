use std::io;
use std::path::PathBuf;

/// Errors surfaced by the logging pipeline's setup and control operations.
///
/// Steady-state I/O failures are never returned; they are reported on stderr
/// and swallowed so that logging cannot take the host application down.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("async writer is already running")]
    AlreadyRunning,

    #[error("async writer is not running")]
    NotRunning,

    #[error("failed to spawn background thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid severity '{0}', expected one of trace, debug, info, warn, error, fatal")]
    InvalidSeverity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LogError::OpenFile {
            path: PathBuf::from("/nonexistent/app.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };
        assert_eq!(
            error.to_string(),
            "failed to open log file /nonexistent/app.log: no such directory"
        );
        assert_eq!(
            LogError::InvalidConfig("roll size must be positive".into()).to_string(),
            "invalid configuration: roll size must be positive"
        );
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;
        let error = LogError::Spawn(io::Error::new(io::ErrorKind::Other, "limit"));
        assert!(error.source().is_some());
        assert!(LogError::AlreadyRunning.source().is_none());
    }
}
