use thiserror::Error;

/// Top-level error type for the Echo system.
///
/// Subsystem crates keep their own error enums and convert into this one
/// where a failure crosses a crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EchoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for EchoError {
    fn from(err: toml::de::Error) -> Self {
        EchoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EchoError {
    fn from(err: toml::ser::Error) -> Self {
        EchoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EchoError {
    fn from(err: serde_json::Error) -> Self {
        EchoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Echo operations.
pub type Result<T> = std::result::Result<T, EchoError>;
