use crate::{FailureKind, PlaybackRate, PlaybackState, RecordingState};

/// Observable session state, published after every handled event.
///
/// Carries no rendering concerns; presentation layers map it to whatever
/// they draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSnapshot {
    /// Recording state machine.
    pub recording: RecordingState,
    /// Playback state machine.
    pub playback: PlaybackState,
    /// Rate applied to current and future playback.
    pub rate: PlaybackRate,
    /// An echo exchange is running (busy indicator).
    pub exchange_in_flight: bool,
    /// Most recent failure since the last recording cycle began.
    pub last_failure: Option<FailureKind>,
}
