//! Echo Recorder Core Library
//!
//! Records a short clip, sends it to an echo server, and plays the echoed
//! copy back at a selectable speed. The [`SessionController`] owns the
//! recording and playback state machines; microphone, speaker and network
//! are injected as capabilities.
//!
//! # Example
//!
//! ```no_run
//! use echo_recorder_core::{
//!     ArtifactStore, CoreResult, CpalCapture, HttpEchoTransport, PlaybackRate, RodioPlayback,
//!     SessionController,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> CoreResult<()> {
//!     let store = ArtifactStore::open("/tmp/echo-recorder")?;
//!     let transport = HttpEchoTransport::new("http://127.0.0.1:5000", Duration::from_secs(30))?;
//!
//!     let controller = SessionController::new(
//!         Box::new(CpalCapture::new()),
//!         Box::new(RodioPlayback::new()),
//!         Arc::new(transport),
//!         store,
//!         PlaybackRate::NORMAL,
//!     );
//!     let handle = controller.handle();
//!
//!     let local = tokio::task::LocalSet::new();
//!     local.spawn_local(controller.run());
//!     local
//!         .run_until(async move {
//!             handle.begin_recording()?;
//!             tokio::time::sleep(Duration::from_secs(3)).await;
//!             handle.end_recording()?;
//!             handle.shutdown()
//!         })
//!         .await
//! }
//! ```

mod artifact;
mod audio;
mod error;
mod session;
mod transport;

pub use {
    artifact::{ArtifactName, ArtifactStore},
    audio::{
        AudioCapture, AudioPlayback, CpalCapture, FinishedSignal, PermissionStatus, RodioPlayback,
    },
    error::{FailureKind, Result as CoreResult, SessionError},
    session::{
        PlaybackRate, PlaybackState, RecordingState, SessionController, SessionEvent,
        SessionHandle, SessionSnapshot,
    },
    transport::{EchoTransport, HttpEchoTransport},
};

#[cfg(test)]
mod tests;
