use crate::{AppCommand, AppResult, StatusView};

use std::future::Future;

use echo_recorder_core::{PlaybackRate, SessionHandle, SessionSnapshot};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::watch,
};
use tracing::{debug, info, instrument, warn};

/// Console front end for a running session.
///
/// Reads one command per input line, forwards it to the session controller,
/// and prints a status line whenever the published snapshot changes. It
/// never touches session state directly.
pub struct App<W> {
    pub(crate) session: SessionHandle,
    pub(crate) snapshots: watch::Receiver<SessionSnapshot>,
    pub(crate) fast_rate: PlaybackRate,
    pub(crate) output: W,
    pub(crate) status: StatusView,
}

impl<W> App<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a front end writing to `output`.
    pub(crate) fn new(
        session: SessionHandle,
        snapshots: watch::Receiver<SessionSnapshot>,
        fast_rate: PlaybackRate,
        output: W,
    ) -> Self {
        Self {
            session,
            snapshots,
            fast_rate,
            output,
            status: StatusView::default(),
        }
    }

    /// Run until `quit`, end of input, `interrupt` resolving, or the session
    /// ending on its own.
    #[instrument(skip_all)]
    pub(crate) async fn run<R, S>(mut self, input: R, interrupt: S) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        info!("Echo Recorder console starting");

        self.write_line(AppCommand::USAGE).await?;
        let initial = *self.snapshots.borrow_and_update();
        self.show(&initial).await?;

        let mut lines = input.lines();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match line.parse::<AppCommand>() {
                        Ok(AppCommand::Quit) => {
                            info!("Quit requested");
                            break;
                        }
                        Ok(AppCommand::Help) => self.write_line(AppCommand::USAGE).await?,
                        Ok(command) => self.dispatch(command)?,
                        Err(e) => {
                            warn!(error = %e, "Ignoring console input");
                            self.write_line("unknown command, type 'help'").await?;
                        }
                    }
                }

                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        info!("Session ended");
                        return Ok(());
                    }
                    let snapshot = *self.snapshots.borrow_and_update();
                    self.show(&snapshot).await?;
                }

                () = &mut interrupt => {
                    info!("Interrupt received");
                    break;
                }
            }
        }

        if let Err(e) = self.session.shutdown() {
            debug!(error = %e, "Session already stopped");
        }

        Ok(())
    }

    /// Forward a control command to the session.
    #[instrument(skip(self))]
    pub(crate) fn dispatch(&self, command: AppCommand) -> AppResult<()> {
        match command {
            AppCommand::BeginRecording => self.session.begin_recording()?,
            AppCommand::EndRecording => self.session.end_recording()?,
            AppCommand::TogglePlayback => self.session.toggle_playback()?,
            AppCommand::Fast => self.session.set_playback_rate(self.fast_rate)?,
            AppCommand::Normal => self.session.set_playback_rate(PlaybackRate::NORMAL)?,
            AppCommand::Retry => self.session.retry_setup()?,
            AppCommand::Help | AppCommand::Quit => {}
        }

        Ok(())
    }

    async fn show(&mut self, snapshot: &SessionSnapshot) -> AppResult<()> {
        if let Some(line) = self.status.update(snapshot) {
            self.write_line(&line).await?;
        }
        Ok(())
    }

    async fn write_line(&mut self, text: &str) -> AppResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}
