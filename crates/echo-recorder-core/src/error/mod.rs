use error_location::ErrorLocation;
use thiserror::Error;

/// Session errors with source location tracking.
///
/// Every variant is a state-machine outcome. None of them is fatal to the
/// process: the controller maps each one to a [`FailureKind`] and a state
/// transition.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Microphone access was refused by the user or the platform.
    #[error("Microphone permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture device could not be prepared for recording.
    #[error("Capture device preparation failed: {reason} {location}")]
    DevicePrepareFailed {
        /// Description of the preparation failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture or playback device failed during start/stop/play/pause.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The upload request could not be built.
    #[error("Failed to encode echo request: {reason} {location}")]
    EncodingFailed {
        /// Description of the encoding failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The exchange failed in transit or the server answered non-2xx.
    #[error("Echo exchange failed: {reason} {location}")]
    TransportFailed {
        /// Description of the transport failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An artifact could not be persisted.
    #[error("Failed to write artifact {name}: {source} {location}")]
    ArtifactWriteFailed {
        /// Logical artifact name.
        name: &'static str,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An artifact could not be read back.
    #[error("Failed to read artifact {name}: {source} {location}")]
    ArtifactReadFailed {
        /// Logical artifact name.
        name: &'static str,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The playback device could not load the echo artifact.
    #[error("Playback preparation failed: {reason} {location}")]
    PlaybackPrepareFailed {
        /// Description of the preparation failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Playback rate was zero, negative or not finite.
    #[error("Invalid playback rate: {rate} {location}")]
    InvalidPlaybackRate {
        /// The rejected value.
        rate: f32,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Failed to send a message to the session controller.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Coarse failure category surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// See [`SessionError::PermissionDenied`].
    PermissionDenied,
    /// See [`SessionError::DevicePrepareFailed`].
    DevicePrepareFailed,
    /// See [`SessionError::DeviceError`].
    Device,
    /// See [`SessionError::EncodingFailed`].
    EncodingFailed,
    /// See [`SessionError::TransportFailed`].
    TransportFailed,
    /// See [`SessionError::ArtifactWriteFailed`].
    ArtifactWriteFailed,
    /// See [`SessionError::ArtifactReadFailed`].
    ArtifactReadFailed,
    /// See [`SessionError::PlaybackPrepareFailed`].
    PlaybackPrepareFailed,
    /// See [`SessionError::InvalidPlaybackRate`].
    InvalidPlaybackRate,
    /// See [`SessionError::ChannelSendFailed`].
    ChannelSendFailed,
}

impl SessionError {
    /// Category of this error, without the payload.
    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            SessionError::DevicePrepareFailed { .. } => FailureKind::DevicePrepareFailed,
            SessionError::DeviceError { .. } => FailureKind::Device,
            SessionError::EncodingFailed { .. } => FailureKind::EncodingFailed,
            SessionError::TransportFailed { .. } => FailureKind::TransportFailed,
            SessionError::ArtifactWriteFailed { .. } => FailureKind::ArtifactWriteFailed,
            SessionError::ArtifactReadFailed { .. } => FailureKind::ArtifactReadFailed,
            SessionError::PlaybackPrepareFailed { .. } => FailureKind::PlaybackPrepareFailed,
            SessionError::InvalidPlaybackRate { .. } => FailureKind::InvalidPlaybackRate,
            SessionError::ChannelSendFailed { .. } => FailureKind::ChannelSendFailed,
        }
    }
}

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;
