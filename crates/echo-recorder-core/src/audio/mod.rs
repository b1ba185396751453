mod capture;
pub(crate) mod cpal_capture;
mod playback;
mod rodio_playback;

pub use {
    capture::{AudioCapture, PermissionStatus},
    cpal_capture::CpalCapture,
    playback::{AudioPlayback, FinishedSignal},
    rodio_playback::RodioPlayback,
};
