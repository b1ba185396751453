use crate::{
    ArtifactName, ArtifactStore, AudioCapture, AudioPlayback, CoreResult, EchoTransport,
    FailureKind, FinishedSignal, PermissionStatus, PlaybackRate, PlaybackState, RecordingState,
    SessionError, SessionEvent, SessionHandle, SessionSnapshot,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Owns the recording and playback state machines and sequences
/// capture → exchange → persist → playback.
///
/// Every input arrives as a [`SessionEvent`] on one queue and is handled to
/// completion before the next, so the two states have a single writer.
/// The only suspending work (the echo exchange and the permission prompt)
/// runs on spawned tasks that post their result back into that queue.
///
/// Capabilities may hold `!Send` device handles, so the controller itself
/// is `!Send`; run it with `tokio::task::spawn_local`.
pub struct SessionController {
    capture: Box<dyn AudioCapture>,
    playback: Box<dyn AudioPlayback>,
    transport: Arc<dyn EchoTransport>,
    store: ArtifactStore,

    recording: RecordingState,
    playback_state: PlaybackState,
    rate: PlaybackRate,
    /// Cycle whose recording is being captured.
    cycle_id: Option<Uuid>,
    /// Cycle whose exchange is in flight.
    exchange: Option<Uuid>,
    /// A permission prompt is awaiting the user's answer.
    permission_pending: bool,
    /// Incremented on every echo load; stale finished signals are dropped.
    generation: u64,
    last_failure: Option<FailureKind>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Create a controller in the initial Disabled/Disabled state.
    pub fn new(
        capture: Box<dyn AudioCapture>,
        playback: Box<dyn AudioPlayback>,
        transport: Arc<dyn EchoTransport>,
        store: ArtifactStore,
        rate: PlaybackRate,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let initial = SessionSnapshot {
            rate,
            ..SessionSnapshot::default()
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            capture,
            playback,
            transport,
            store,
            recording: RecordingState::Disabled,
            playback_state: PlaybackState::Disabled,
            rate,
            cycle_id: None,
            exchange: None,
            permission_pending: false,
            generation: 0,
            last_failure: None,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    /// Command sender for user-facing surfaces.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.events_tx.clone())
    }

    /// Receive a snapshot after every handled event.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state of both machines.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            recording: self.recording,
            playback: self.playback_state,
            rate: self.rate,
            exchange_in_flight: self.exchange.is_some(),
            last_failure: self.last_failure,
        }
    }

    /// Run the permission check, then process events until shutdown.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Session controller running");

        self.initialize();
        while self.process_next().await {}

        info!("Session controller stopped");
    }

    /// Wait for the next queued event and handle it.
    ///
    /// Returns `false` once a shutdown has been processed.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Handle one event. Returns `false` on shutdown.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Initialize => self.initialize(),
            SessionEvent::PermissionResolved { granted } => {
                self.permission_pending = false;
                self.on_permission_result(granted);
            }
            SessionEvent::BeginRecording => {
                self.begin_recording();
            }
            SessionEvent::EndRecording => {
                self.end_recording();
            }
            SessionEvent::TogglePlayback => {
                self.toggle_playback();
            }
            SessionEvent::SetPlaybackRate(rate) => {
                self.set_playback_rate(rate);
            }
            SessionEvent::PlaybackFinished { generation } => self.on_playback_finished(generation),
            SessionEvent::ExchangeCompleted { cycle_id, outcome } => {
                self.complete_exchange(cycle_id, outcome)
            }
            SessionEvent::Shutdown => {
                info!("Shutdown requested");
                return false;
            }
        }

        true
    }

    /// Check microphone permission and prepare the capture device.
    ///
    /// An undetermined permission is requested on a spawned task; its answer
    /// comes back as [`SessionEvent::PermissionResolved`].
    #[instrument(skip(self))]
    pub fn initialize(&mut self) {
        if self.recording == RecordingState::Recording {
            debug!("Recording in progress, setup not re-run");
            return;
        }
        if self.permission_pending {
            debug!("Permission prompt already pending, setup not re-run");
            return;
        }

        match self.capture.check_permission() {
            PermissionStatus::Granted => self.on_permission_result(true),
            PermissionStatus::Denied => self.on_permission_result(false),
            PermissionStatus::Undetermined => {
                info!("Requesting microphone permission");
                self.permission_pending = true;
                let request = self.capture.request_permission();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let granted = request.await;
                    if tx.send(SessionEvent::PermissionResolved { granted }).is_err() {
                        debug!("Controller gone, permission result dropped");
                    }
                });
            }
        }
    }

    /// Apply a permission answer: prepare the device or disable recording.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn on_permission_result(&mut self, granted: bool) {
        if self.recording == RecordingState::Recording {
            debug!("Recording in progress, permission result ignored");
            return;
        }

        if !granted {
            self.recording = RecordingState::Disabled;
            self.record_failure(SessionError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            });
            self.publish();
            return;
        }

        let destination = self.store.path(ArtifactName::Recording);
        match self.capture.prepare(&destination) {
            Ok(()) => {
                self.recording = RecordingState::Idle;
                info!("Recorder ready");
            }
            Err(e) => {
                self.recording = RecordingState::Disabled;
                self.record_failure(e);
            }
        }

        self.publish();
    }

    /// Press-start of the record control. Returns whether it was accepted.
    #[instrument(skip(self))]
    pub fn begin_recording(&mut self) -> bool {
        if self.recording != RecordingState::Idle {
            debug!(state = ?self.recording, "Begin recording rejected");
            return false;
        }
        if let Some(cycle_id) = self.exchange {
            debug!(cycle_id = %cycle_id, "Begin recording rejected, exchange in flight");
            return false;
        }

        if self.playback_state.is_active() {
            debug!(playback = ?self.playback_state, "Begin recording rejected during playback");
            return false;
        }

        self.last_failure = None;

        match self.capture.start() {
            Ok(()) => {
                let cycle_id = Uuid::new_v4();
                self.cycle_id = Some(cycle_id);
                self.recording = RecordingState::Recording;
                info!(cycle_id = %cycle_id, "Recording started");
            }
            Err(e) => self.record_failure(e),
        }

        self.publish();
        true
    }

    /// Release of the record control. Stops capture and dispatches the
    /// exchange. Returns whether it was accepted.
    #[instrument(skip(self))]
    pub fn end_recording(&mut self) -> bool {
        if self.recording != RecordingState::Recording {
            debug!(state = ?self.recording, "End recording rejected");
            return false;
        }

        let cycle_id = self.cycle_id.take().unwrap_or_else(Uuid::new_v4);
        let stopped = self.capture.stop();
        self.recording = RecordingState::Idle;

        let recording = stopped.and_then(|()| self.store.read(ArtifactName::Recording));
        match recording {
            Ok(bytes) => self.dispatch_exchange(cycle_id, bytes),
            Err(e) => {
                warn!(cycle_id = %cycle_id, "Recording unavailable, no exchange started");
                self.record_failure(e);
            }
        }

        self.publish();
        true
    }

    /// Play/pause control. Returns whether a transition happened.
    #[instrument(skip(self))]
    pub fn toggle_playback(&mut self) -> bool {
        if self.recording == RecordingState::Recording {
            debug!("Toggle playback rejected while recording");
            return false;
        }

        let result = match self.playback_state {
            PlaybackState::Disabled => {
                debug!("Nothing to play");
                return false;
            }
            PlaybackState::Idle | PlaybackState::Paused => self
                .playback
                .play()
                .map(|()| PlaybackState::Playing),
            PlaybackState::Playing => self.playback.pause().map(|()| PlaybackState::Paused),
        };

        let changed = match result {
            Ok(next) => {
                info!(from = ?self.playback_state, to = ?next, "Playback toggled");
                self.playback_state = next;
                true
            }
            Err(e) => {
                self.record_failure(e);
                false
            }
        };

        self.publish();
        changed
    }

    /// Completion callback from the playback device.
    #[instrument(skip(self))]
    pub fn on_playback_finished(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(current = self.generation, "Stale finished signal ignored");
            return;
        }
        if self.playback_state != PlaybackState::Playing {
            debug!(state = ?self.playback_state, "Finished signal ignored");
            return;
        }

        self.playback_state = PlaybackState::Idle;
        info!("Playback finished");
        self.publish();
    }

    /// Change speed for current and future playback. Returns whether the
    /// rate actually changed.
    #[instrument(skip(self))]
    pub fn set_playback_rate(&mut self, rate: PlaybackRate) -> bool {
        if rate == self.rate {
            debug!(%rate, "Playback rate unchanged");
            return false;
        }

        if self.playback_state != PlaybackState::Disabled {
            if let Err(e) = self.playback.set_rate(rate) {
                self.record_failure(e);
                self.publish();
                return false;
            }
        }

        self.rate = rate;
        info!(%rate, "Playback rate set");
        self.publish();
        true
    }

    /// Apply the outcome of an echo exchange.
    #[instrument(skip(self, outcome))]
    pub fn complete_exchange(&mut self, cycle_id: Uuid, outcome: CoreResult<Vec<u8>>) {
        if self.exchange != Some(cycle_id) {
            warn!(cycle_id = %cycle_id, "Completion for unknown exchange ignored");
            return;
        }
        self.exchange = None;

        match outcome {
            Ok(bytes) => {
                info!(cycle_id = %cycle_id, bytes = bytes.len(), "Exchange succeeded");
                self.install_echo(&bytes);
            }
            Err(e) => {
                warn!(cycle_id = %cycle_id, "Exchange failed, previous echo kept");
                self.record_failure(e);
            }
        }

        self.publish();
    }

    fn dispatch_exchange(&mut self, cycle_id: Uuid, bytes: Vec<u8>) {
        info!(cycle_id = %cycle_id, bytes = bytes.len(), "Dispatching echo exchange");

        self.exchange = Some(cycle_id);
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let outcome = transport.exchange(bytes).await;
            if tx
                .send(SessionEvent::ExchangeCompleted { cycle_id, outcome })
                .is_err()
            {
                debug!(cycle_id = %cycle_id, "Controller gone, exchange result dropped");
            }
        });
    }

    /// Persist the echo, then load it. The previous clip is stopped first so
    /// nothing is reading the artifact while it is replaced.
    fn install_echo(&mut self, bytes: &[u8]) {
        if self.playback_state.is_active() {
            self.stop_playback();
        }

        if let Err(e) = self.store.write(ArtifactName::Echo, bytes) {
            self.playback_state = PlaybackState::Disabled;
            self.record_failure(e);
            return;
        }

        self.generation += 1;
        let finished = FinishedSignal::new(self.events_tx.clone(), self.generation);
        let source = self.store.path(ArtifactName::Echo);

        match self.playback.load(&source, self.rate, finished) {
            Ok(()) => {
                self.playback_state = PlaybackState::Idle;
                info!(generation = self.generation, "Echo ready for playback");
            }
            Err(e) => {
                self.playback_state = PlaybackState::Disabled;
                self.record_failure(e);
            }
        }
    }

    fn stop_playback(&mut self) {
        match self.playback.stop() {
            Ok(()) => self.playback_state = PlaybackState::Idle,
            Err(e) => {
                self.playback_state = PlaybackState::Disabled;
                self.record_failure(e);
            }
        }
    }

    fn record_failure(&mut self, error: SessionError) {
        warn!(error = %error, "Session operation failed");
        self.last_failure = Some(error.kind());
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
