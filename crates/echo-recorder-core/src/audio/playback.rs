use crate::{CoreResult, PlaybackRate, SessionEvent};

use std::path::Path;

use tokio::sync::mpsc;
use tracing::debug;

/// Completion signal handed to the playback device on each load.
///
/// Tagged with the load generation so the controller can discard signals
/// from a clip it has since replaced.
#[derive(Debug, Clone)]
pub struct FinishedSignal {
    tx: mpsc::UnboundedSender<SessionEvent>,
    generation: u64,
}

impl FinishedSignal {
    /// Signal that posts into the controller's event queue.
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    /// Load generation this signal belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report that playback ran to the end of the clip.
    pub fn notify(&self) {
        if self
            .tx
            .send(SessionEvent::PlaybackFinished {
                generation: self.generation,
            })
            .is_err()
        {
            debug!(generation = self.generation, "Controller gone, finished signal dropped");
        }
    }
}

/// Audio playback capability driven by the session controller.
///
/// `finished` must be notified exactly once per play-to-completion run and
/// never on `pause` or `stop`.
pub trait AudioPlayback {
    /// Open `source` for playback at `rate`, replacing any loaded clip.
    fn load(&mut self, source: &Path, rate: PlaybackRate, finished: FinishedSignal)
    -> CoreResult<()>;

    /// Start from the beginning, or resume if paused.
    fn play(&mut self) -> CoreResult<()>;

    /// Pause, keeping the position.
    fn pause(&mut self) -> CoreResult<()>;

    /// Halt and rewind without signalling completion.
    fn stop(&mut self) -> CoreResult<()>;

    /// Change speed, including mid-playback.
    fn set_rate(&mut self, rate: PlaybackRate) -> CoreResult<()>;
}
