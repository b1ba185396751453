use crate::AppError;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Console commands mapped onto the session's control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Press of the record control.
    BeginRecording,
    /// Release of the record control.
    EndRecording,
    /// Play/pause toggle.
    TogglePlayback,
    /// Speed switch to the configured fast rate.
    Fast,
    /// Speed switch back to 1.0x.
    Normal,
    /// Re-run permission check and device preparation.
    Retry,
    /// Print the command list.
    Help,
    /// Request application shutdown.
    Quit,
}

impl AppCommand {
    /// One line per command, for `help`.
    pub const USAGE: &'static str = "\
commands:
  rec     start recording
  stop    stop recording and send it to the echo server
  play    play or pause the echo
  fast    play at the fast rate
  normal  play at normal speed
  retry   re-check microphone permission and device
  help    show this list
  quit    exit";
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let command = match input.trim().to_ascii_lowercase().as_str() {
            "rec" | "r" => AppCommand::BeginRecording,
            "stop" | "s" => AppCommand::EndRecording,
            "play" | "p" => AppCommand::TogglePlayback,
            "fast" | "f" => AppCommand::Fast,
            "normal" | "n" => AppCommand::Normal,
            "retry" => AppCommand::Retry,
            "help" | "h" | "?" => AppCommand::Help,
            "quit" | "q" | "exit" => AppCommand::Quit,
            _ => {
                return Err(AppError::UnknownCommand {
                    input: input.trim().to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(command)
    }
}
