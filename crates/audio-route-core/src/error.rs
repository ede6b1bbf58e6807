//! Error types for the audio route library
//!
//! The arbitration engine itself never returns errors: misuse is logged and
//! ignored, collaborator failures shrink the device set. These errors cover
//! the surfaces around it (configuration, logging setup, and the manager
//! handle talking to its control task).

use thiserror::Error;

/// Result type for audio route operations
pub type AudioRouteResult<T> = Result<T, AudioRouteError>;

/// Errors that can occur outside the arbitration cycle itself
#[derive(Debug, Error)]
pub enum AudioRouteError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid state error
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// The manager's control task has ended
    #[error("Audio route manager is closed")]
    ManagerClosed,

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a TOML configuration failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Installing the tracing subscriber failed
    #[error("Logging setup error: {message}")]
    Logging { message: String },
}

impl AudioRouteError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a logging setup error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}
