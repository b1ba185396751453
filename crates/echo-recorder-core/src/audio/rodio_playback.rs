use crate::{AudioPlayback, CoreResult, FinishedSignal, PlaybackRate, SessionError};

use std::{
    fs::File,
    io::BufReader,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use error_location::ErrorLocation;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, instrument};

struct LoadedClip {
    source: PathBuf,
    sink: Arc<Sink>,
    rate: PlaybackRate,
    finished: FinishedSignal,
    /// A fresh source was appended and nobody is waiting on it yet.
    needs_watch: bool,
}

/// Plays the echo artifact through the default rodio output stream.
///
/// The output stream is opened lazily on the first `load`, so a missing
/// output device surfaces as a playback preparation failure.
pub struct RodioPlayback {
    stream: Option<OutputStream>,
    clip: Option<LoadedClip>,
    /// Bumped on every `load`, `stop` and play-from-start. A completion
    /// watcher only fires if the run it was spawned for is still current.
    run: Arc<AtomicU64>,
}

impl RodioPlayback {
    /// Create a playback device with no stream open yet.
    pub fn new() -> Self {
        Self {
            stream: None,
            clip: None,
            run: Arc::new(AtomicU64::new(0)),
        }
    }

    #[track_caller]
    fn output_stream(&mut self) -> CoreResult<&OutputStream> {
        if self.stream.is_none() {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                SessionError::PlaybackPrepareFailed {
                    reason: format!("Failed to open output stream: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;
            info!("Audio output stream opened");
            self.stream = Some(stream);
        }

        self.stream
            .as_ref()
            .ok_or(SessionError::PlaybackPrepareFailed {
                reason: "Output stream unavailable".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn paused_sink(&mut self, rate: PlaybackRate) -> CoreResult<Sink> {
        let stream = self.output_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.set_speed(rate.get());
        Ok(sink)
    }

    fn watch_until_end(&self, clip: &LoadedClip) {
        let token = self.run.fetch_add(1, Ordering::AcqRel) + 1;
        let run = Arc::clone(&self.run);
        let sink = Arc::clone(&clip.sink);
        let finished = clip.finished.clone();

        std::thread::spawn(move || {
            sink.sleep_until_end();
            if run.load(Ordering::Acquire) == token {
                finished.notify();
            } else {
                debug!(token, "Playback run superseded, completion suppressed");
            }
        });
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[track_caller]
fn decode(source: &Path) -> CoreResult<Decoder<BufReader<File>>> {
    let file = File::open(source).map_err(|e| SessionError::PlaybackPrepareFailed {
        reason: format!("Failed to open {:?}: {}", source, e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| SessionError::PlaybackPrepareFailed {
        reason: format!("Failed to decode {:?}: {}", source, e),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn not_loaded() -> SessionError {
    SessionError::DeviceError {
        reason: "No clip loaded".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

impl AudioPlayback for RodioPlayback {
    #[track_caller]
    #[instrument(skip(self, finished), fields(generation = finished.generation()))]
    fn load(
        &mut self,
        source: &Path,
        rate: PlaybackRate,
        finished: FinishedSignal,
    ) -> CoreResult<()> {
        if let Some(previous) = self.clip.take() {
            self.run.fetch_add(1, Ordering::AcqRel);
            previous.sink.stop();
        }

        let decoder = decode(source)?;
        let sink = self.paused_sink(rate)?;
        sink.append(decoder);

        self.clip = Some(LoadedClip {
            source: source.to_path_buf(),
            sink: Arc::new(sink),
            rate,
            finished,
            needs_watch: true,
        });

        info!(source = ?source, %rate, "Clip loaded");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn play(&mut self) -> CoreResult<()> {
        let clip = self.clip.as_mut().ok_or_else(not_loaded)?;

        if clip.sink.empty() {
            let decoder = decode(&clip.source)?;
            clip.sink.append(decoder);
            clip.needs_watch = true;
        }

        let clip = self.clip.as_ref().ok_or_else(not_loaded)?;
        if clip.needs_watch {
            self.watch_until_end(clip);
        }
        if let Some(clip) = self.clip.as_mut() {
            clip.needs_watch = false;
            clip.sink.play();
        }

        debug!("Playback started");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn pause(&mut self) -> CoreResult<()> {
        let clip = self.clip.as_ref().ok_or_else(not_loaded)?;
        clip.sink.pause();
        debug!("Playback paused");
        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn stop(&mut self) -> CoreResult<()> {
        let rate = self.clip.as_ref().ok_or_else(not_loaded)?.rate;

        self.run.fetch_add(1, Ordering::AcqRel);
        let fresh = self.paused_sink(rate)?;

        if let Some(clip) = self.clip.as_mut() {
            clip.sink.stop();
            clip.sink = Arc::new(fresh);
            clip.needs_watch = false;
        }

        debug!("Playback stopped");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn set_rate(&mut self, rate: PlaybackRate) -> CoreResult<()> {
        if let Some(clip) = self.clip.as_mut() {
            clip.sink.set_speed(rate.get());
            clip.rate = rate;
        }
        debug!(%rate, "Playback rate applied");
        Ok(())
    }
}
