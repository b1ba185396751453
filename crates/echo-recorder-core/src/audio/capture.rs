use crate::CoreResult;

use std::path::Path;

use futures::future::BoxFuture;

/// Microphone permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Access granted.
    Granted,
    /// Access refused.
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// Microphone capture capability driven by the session controller.
///
/// Implementations may hold `!Send` device handles; the controller runs on
/// a local task set. Failures are returned synchronously and never retried.
pub trait AudioCapture {
    /// Current permission state, without prompting.
    fn check_permission(&self) -> PermissionStatus;

    /// Prompt for permission. The future resolves once the user responds.
    fn request_permission(&self) -> BoxFuture<'static, bool>;

    /// Bind the capture device to the file recordings are written to.
    fn prepare(&mut self, destination: &Path) -> CoreResult<()>;

    /// Begin capturing.
    fn start(&mut self) -> CoreResult<()>;

    /// Stop capturing and flush the recording to the prepared destination.
    fn stop(&mut self) -> CoreResult<()>;
}
