use thiserror::Error;

/// Failure to turn a service-data blob into a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload truncated: got {len} bytes, need at least {min}")]
    Truncated { len: usize, min: usize },
}

/// Failure reported by a single notification backend.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected message with status {0}")]
    Status(u16),

    #[error("failed to launch notifier process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("notifier process exited with {0}")]
    Exit(std::process::ExitStatus),

    #[error("delivery timed out after {0} seconds")]
    Timeout(u64),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("unknown notification backend '{0}'")]
    UnknownBackend(String),

    #[error("invalid webhook URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
