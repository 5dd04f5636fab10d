use thiserror::Error;

/// A backend could not be constructed from its configuration.
#[derive(Error, Debug)]
pub enum BackendConfigError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid process command {0:?}: expected `definition=program [args...]`")]
    InvalidCommand(String),

    #[cfg(feature = "http")]
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
