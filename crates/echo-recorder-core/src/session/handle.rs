use crate::{CoreResult, PlaybackRate, SessionError, SessionEvent};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::mpsc;

/// Cloneable, `Send` command sender for a [`SessionController`].
///
/// Commands are queued and handled in order on the controller's task.
///
/// [`SessionController`]: crate::SessionController
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Re-run the permission check and device preparation.
    #[track_caller]
    pub fn retry_setup(&self) -> CoreResult<()> {
        self.send(SessionEvent::Initialize)
    }

    /// Press-start of the record control.
    #[track_caller]
    pub fn begin_recording(&self) -> CoreResult<()> {
        self.send(SessionEvent::BeginRecording)
    }

    /// Release of the record control.
    #[track_caller]
    pub fn end_recording(&self) -> CoreResult<()> {
        self.send(SessionEvent::EndRecording)
    }

    /// Play/pause control.
    #[track_caller]
    pub fn toggle_playback(&self) -> CoreResult<()> {
        self.send(SessionEvent::TogglePlayback)
    }

    /// Speed switch.
    #[track_caller]
    pub fn set_playback_rate(&self, rate: PlaybackRate) -> CoreResult<()> {
        self.send(SessionEvent::SetPlaybackRate(rate))
    }

    /// Ask the controller loop to exit.
    #[track_caller]
    pub fn shutdown(&self) -> CoreResult<()> {
        self.send(SessionEvent::Shutdown)
    }

    #[track_caller]
    fn send(&self, event: SessionEvent) -> CoreResult<()> {
        self.tx
            .send(event)
            .map_err(|e| SessionError::ChannelSendFailed {
                message: format!("Session controller is not running: {:?}", e.0),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
