use echo_recorder_core::{FailureKind, PlaybackState, RecordingState, SessionSnapshot};

/// Renders session snapshots as one status line.
///
/// Keeps the last line so callers only print when something visible
/// changed.
#[derive(Debug, Default)]
pub struct StatusView {
    last: Option<String>,
}

impl StatusView {
    /// Status line for `snapshot`.
    pub fn render(snapshot: &SessionSnapshot) -> String {
        let recording = match snapshot.recording {
            RecordingState::Disabled => "unavailable",
            RecordingState::Idle if snapshot.exchange_in_flight => "sending",
            RecordingState::Idle => "ready",
            RecordingState::Recording => "recording",
        };

        let playback = match snapshot.playback {
            PlaybackState::Disabled => "no echo",
            PlaybackState::Idle => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        };

        let mut line = format!(
            "[mic: {}] [echo: {} @ {}]",
            recording, playback, snapshot.rate
        );

        if let Some(failure) = snapshot.last_failure {
            line.push_str(" ! ");
            line.push_str(failure_message(failure));
        }

        line
    }

    /// Render `snapshot`, returning `None` if the line is unchanged.
    pub fn update(&mut self, snapshot: &SessionSnapshot) -> Option<String> {
        let line = Self::render(snapshot);
        if self.last.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last = Some(line.clone());
        Some(line)
    }
}

/// User-facing text for a failure category.
pub fn failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::PermissionDenied => "microphone permission denied (type 'retry')",
        FailureKind::DevicePrepareFailed => "microphone unavailable (type 'retry')",
        FailureKind::Device => "audio device error",
        FailureKind::EncodingFailed => "could not build upload",
        FailureKind::TransportFailed => "echo server unreachable or refused the upload",
        FailureKind::ArtifactWriteFailed => "could not save audio",
        FailureKind::ArtifactReadFailed => "could not read recording",
        FailureKind::PlaybackPrepareFailed => "echo could not be played",
        FailureKind::InvalidPlaybackRate => "invalid playback rate",
        FailureKind::ChannelSendFailed => "session stopped",
    }
}
