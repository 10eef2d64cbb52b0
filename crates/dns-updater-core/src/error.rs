//! Error types for the updater
//!
//! Every component reports one of these kinds; the update cycle passes them
//! up unchanged and the poll loop only logs them.

use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (connection refused, DNS failure, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote answered, but not with a well-formed success response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The response was well-formed but lacked the expected data
    #[error("Data error: {0}")]
    Data(String),

    /// Locally detectable bad input, e.g. an IP value that is not IPv4
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The provider API rejected the request
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Local persistence I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or invalid setup, fatal at construction time
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was aborted by the shutdown signal
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if this error only reports that shutdown interrupted the call
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
