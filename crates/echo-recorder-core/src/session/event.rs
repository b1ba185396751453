use crate::{CoreResult, PlaybackRate};

/// Everything the session controller reacts to.
///
/// User commands, permission results, exchange completions and playback
/// completion signals all travel through the same queue, so the controller
/// handles exactly one at a time.
#[derive(Debug)]
pub enum SessionEvent {
    /// Re-run the permission check and device preparation.
    Initialize,
    /// Result of a (possibly suspended) permission request.
    PermissionResolved {
        /// Whether the user granted microphone access.
        granted: bool,
    },
    /// Press-start of the record control.
    BeginRecording,
    /// Release of the record control.
    EndRecording,
    /// Play/pause control.
    TogglePlayback,
    /// Speed switch.
    SetPlaybackRate(PlaybackRate),
    /// Playback reached the end of the clip.
    PlaybackFinished {
        /// Load generation the signal belongs to.
        generation: u64,
    },
    /// Echo exchange finished, successfully or not.
    ExchangeCompleted {
        /// Recording cycle the exchange belongs to.
        cycle_id: uuid::Uuid,
        /// Echoed bytes or the failure.
        outcome: CoreResult<Vec<u8>>,
    },
    /// Stop the controller loop.
    Shutdown,
}
