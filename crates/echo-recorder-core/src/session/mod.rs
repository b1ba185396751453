mod controller;
mod event;
mod handle;
mod snapshot;
mod state;

pub use {
    controller::SessionController,
    event::SessionEvent,
    handle::SessionHandle,
    snapshot::SessionSnapshot,
    state::{PlaybackRate, PlaybackState, RecordingState},
};
