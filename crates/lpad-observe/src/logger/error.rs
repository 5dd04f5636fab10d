use thiserror::Error;

/// Failure to set up the process-wide log subscriber.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text, json or journald)")]
    InvalidFormat(String),
    #[error("invalid log filter {0:?}")]
    InvalidLogLevel(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global log subscriber is already installed")]
    AlreadyInitialized,
    #[error("log subscriber setup failed: {0}")]
    InitializationFailed(String),
}
