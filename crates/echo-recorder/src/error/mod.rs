use echo_recorder_core::SessionError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the echo-recorder binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Session error from echo-recorder-core.
    #[error("Session error: {source} {location}")]
    Session {
        /// The underlying session error.
        #[source]
        source: SessionError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading, saving or validation error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Console input that is not a known command.
    #[error("Unknown command '{input}' {location}")]
    UnknownCommand {
        /// The rejected input, trimmed.
        input: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The session task ended abnormally.
    #[error("Session task failed: {reason} {location}")]
    TaskFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem or console operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// Manual From<SessionError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<SessionError> for AppError {
    #[track_caller]
    fn from(source: SessionError) -> Self {
        AppError::Session {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
