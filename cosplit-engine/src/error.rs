//! Engine error types

use thiserror::Error;

/// Errors raised while managing or calling splitting engines
#[derive(Error, Debug)]
pub enum EngineError {
    /// No descriptor is registered under this name
    #[error("unknown method '{name}'")]
    UnknownMethod {
        /// The requested method name
        name: String,
    },

    /// The external engine failed to initialize
    #[error("engine '{method}' failed to start: {reason}")]
    EngineStart {
        /// Method whose engine failed
        method: String,
        /// What went wrong
        reason: String,
    },

    /// A single split request failed
    #[error("engine '{method}' failed to split: {reason}")]
    EngineCall {
        /// Method whose engine failed
        method: String,
        /// What went wrong
        reason: String,
    },

    /// Fetching or extracting engine resources failed
    #[error("engine '{method}' failed to prepare: {reason}")]
    Prepare {
        /// Method being prepared
        method: String,
        /// What went wrong
        reason: String,
    },

    /// The manager was shut down and accepts no further requests
    #[error("engine manager has been shut down")]
    ManagerClosed,

    /// A method descriptor could not be read
    #[error("invalid method descriptor {path}: {reason}")]
    Descriptor {
        /// Path of the offending descriptor
        path: String,
        /// Parse or validation failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl EngineError {
    /// Whether repeating the operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::EngineStart { .. } | EngineError::EngineCall { .. }
        )
    }

    pub(crate) fn start(method: &str, reason: impl Into<String>) -> Self {
        EngineError::EngineStart {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn call(method: &str, reason: impl Into<String>) -> Self {
        EngineError::EngineCall {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
