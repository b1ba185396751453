use crate::{
    AppResult,
    config::{default_fast_rate, default_start_fast},
};

use echo_recorder_core::PlaybackRate;
use serde::{Deserialize, Serialize};

/// Playback speed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Multiplier used by the `fast` command.
    #[serde(default = "default_fast_rate")]
    pub fast_rate: f32,
    /// Start in fast mode instead of normal speed.
    #[serde(default = "default_start_fast")]
    pub start_fast: bool,
}

impl PlaybackConfig {
    /// The validated fast rate.
    #[track_caller]
    pub fn fast_rate(&self) -> AppResult<PlaybackRate> {
        Ok(PlaybackRate::new(self.fast_rate)?)
    }

    /// Rate the session starts with.
    #[track_caller]
    pub fn initial_rate(&self) -> AppResult<PlaybackRate> {
        if self.start_fast {
            self.fast_rate()
        } else {
            Ok(PlaybackRate::NORMAL)
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fast_rate: default_fast_rate(),
            start_fast: default_start_fast(),
        }
    }
}
