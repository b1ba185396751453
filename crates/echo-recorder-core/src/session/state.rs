use crate::{CoreResult, SessionError};

use std::{fmt, panic::Location};

use error_location::ErrorLocation;

/// Whether capture may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Permission missing or capture device not prepared.
    #[default]
    Disabled,
    /// Ready to start recording.
    Idle,
    /// Currently capturing audio.
    Recording,
}

/// Whether playback controls are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No playable echo loaded.
    #[default]
    Disabled,
    /// Echo loaded, not playing.
    Idle,
    /// Echo is playing.
    Playing,
    /// Playback paused mid-clip.
    Paused,
}

impl PlaybackState {
    /// True while the playback device is holding an in-progress clip.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Playback speed multiplier. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PlaybackRate(f32);

impl PlaybackRate {
    /// Normal speed.
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);
    /// The "fast" switch position.
    pub const FAST: PlaybackRate = PlaybackRate(1.5);

    /// Validate and wrap a rate.
    #[track_caller]
    pub fn new(rate: f32) -> CoreResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SessionError::InvalidPlaybackRate {
                rate,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Self(rate))
    }

    /// Raw multiplier.
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}
