use crate::{
    ArtifactName, FailureKind, PermissionStatus, PlaybackRate, PlaybackState, RecordingState,
    SessionEvent,
    tests::fakes::{FakeCapture, FakePlayback, FakeTransport, Harness, RECORDED_BYTES, Reply},
};

use std::sync::Arc;

use tokio::sync::Notify;

const ECHO_BYTES: [u8; 2] = [0x01, 0x02];

/// WHAT: Controller starts with both machines disabled
/// WHY: Nothing may be recorded or played before permission is checked
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_controller_when_not_initialized_then_both_states_disabled() {
    // Given: A freshly constructed controller
    let harness = Harness::new(
        FakeCapture::granted(),
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );

    // When: Reading its snapshot
    let snapshot = harness.controller.snapshot();

    // Then: Recording and playback are disabled at normal speed
    assert_eq!(snapshot.recording, RecordingState::Disabled);
    assert_eq!(snapshot.playback, PlaybackState::Disabled);
    assert_eq!(snapshot.rate, PlaybackRate::NORMAL);
    assert!(!snapshot.exchange_in_flight);
    assert_eq!(snapshot.last_failure, None);
}

/// WHAT: Denied permission keeps recording disabled
/// WHY: The capture device must never start without permission
#[test]
#[allow(clippy::unwrap_used)]
fn given_denied_permission_when_beginning_recording_then_no_effect() {
    // Given: A controller whose capture reports denied permission
    let mut harness = Harness::new(
        FakeCapture::with_permission(PermissionStatus::Denied),
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();

    // When: The user presses record
    let accepted = harness.controller.begin_recording();

    // Then: Nothing starts and the denial is surfaced
    assert!(!accepted);
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Disabled);
    assert_eq!(snapshot.last_failure, Some(FailureKind::PermissionDenied));
    assert_eq!(harness.capture.lock().unwrap().starts, 0);
    assert!(harness.capture.lock().unwrap().prepared.is_empty());
}

/// WHAT: Undetermined permission is requested and a grant enables recording
/// WHY: The prompt suspends, so its answer must come back through the queue
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_undetermined_permission_when_user_grants_then_recording_idle() {
    // Given: Permission not yet asked, user will grant
    let mut harness = Harness::new(
        FakeCapture::with_permission(PermissionStatus::Undetermined),
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );

    // When: Initializing, then processing the queued answer
    harness.controller.initialize();
    assert_eq!(
        harness.controller.snapshot().recording,
        RecordingState::Disabled
    );
    assert!(harness.controller.process_next().await);

    // Then: Device prepared against the recording artifact, recorder idle
    assert_eq!(harness.controller.snapshot().recording, RecordingState::Idle);
    let log = harness.capture.lock().unwrap();
    assert_eq!(log.permission_requests, 1);
    assert_eq!(
        log.prepared,
        vec![harness.store.path(ArtifactName::Recording)]
    );
}

/// WHAT: Undetermined permission that the user refuses disables recording
/// WHY: A refusal is terminal until the next setup retry
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_undetermined_permission_when_user_refuses_then_recording_disabled() {
    // Given: Permission not yet asked, user will refuse
    let mut capture = FakeCapture::with_permission(PermissionStatus::Undetermined);
    capture.grant_on_request = false;
    let mut harness = Harness::new(
        capture,
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );

    // When: Initializing and processing the answer
    harness.controller.initialize();
    assert!(harness.controller.process_next().await);

    // Then: Recording stays disabled with the denial surfaced
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Disabled);
    assert_eq!(snapshot.last_failure, Some(FailureKind::PermissionDenied));
}

/// WHAT: A retry while the permission prompt is open does not ask again
/// WHY: Only one prompt may be outstanding at a time
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_pending_permission_prompt_when_setup_retried_then_single_request() {
    // Given: Permission not yet asked and a prompt already requested
    let mut harness = Harness::new(
        FakeCapture::with_permission(PermissionStatus::Undetermined),
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();

    // When: Setup is retried before the answer is processed
    harness.controller.initialize();

    // Then: One request, and its answer enables recording
    assert_eq!(harness.capture.lock().unwrap().permission_requests, 1);
    assert!(harness.controller.process_next().await);
    assert_eq!(harness.controller.snapshot().recording, RecordingState::Idle);

    // When: Retried after the answer arrived
    harness.controller.initialize();

    // Then: A new prompt is allowed
    assert_eq!(harness.capture.lock().unwrap().permission_requests, 2);
}

/// WHAT: Device preparation failure leaves recording disabled
/// WHY: A granted permission is not enough without a usable device
#[test]
#[allow(clippy::unwrap_used)]
fn given_granted_permission_when_prepare_fails_then_recording_disabled() {
    // Given: A capture device that cannot be prepared
    let mut capture = FakeCapture::granted();
    capture.fail_prepare = true;
    let mut harness = Harness::new(
        capture,
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );

    // When: Initializing
    harness.controller.initialize();

    // Then: Recording disabled, failure surfaced
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Disabled);
    assert_eq!(snapshot.last_failure, Some(FailureKind::DevicePrepareFailed));
}

/// WHAT: A later grant still leaves recording disabled if the device fails
/// WHY: Permission alone never enables recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_denied_then_granted_when_prepare_fails_then_recording_still_disabled() {
    // Given: A controller that was denied and whose device cannot prepare
    let mut capture = FakeCapture::granted();
    capture.fail_prepare = true;
    let mut harness = Harness::new(
        capture,
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.on_permission_result(false);
    assert_eq!(
        harness.controller.snapshot().recording,
        RecordingState::Disabled
    );

    // When: The permission result is re-delivered as granted (prepare still failing)
    harness.controller.on_permission_result(true);

    // Then: Still disabled, now with the device failure
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Disabled);
    assert_eq!(snapshot.last_failure, Some(FailureKind::DevicePrepareFailed));
}

/// WHAT: Full round trip persists the echo and enables playback
/// WHY: Core capture → upload → persist → playback sequence
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_ready_recorder_when_round_trip_succeeds_then_echo_persisted_and_playback_idle() {
    // Given: Permission granted and device prepared
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    assert_eq!(harness.controller.snapshot().recording, RecordingState::Idle);

    // When: Press, release
    assert!(harness.controller.begin_recording());
    assert_eq!(
        harness.controller.snapshot().recording,
        RecordingState::Recording
    );
    assert!(harness.controller.end_recording());

    // Then: Recorder idle immediately, exchange busy
    let busy = harness.controller.snapshot();
    assert_eq!(busy.recording, RecordingState::Idle);
    assert!(busy.exchange_in_flight);
    assert_eq!(busy.playback, PlaybackState::Disabled);

    // When: The exchange completes
    assert!(harness.controller.process_next().await);

    // Then: Echo artifact holds exactly the response and playback is idle
    let done = harness.controller.snapshot();
    assert!(!done.exchange_in_flight);
    assert_eq!(done.playback, PlaybackState::Idle);
    assert_eq!(done.recording, RecordingState::Idle);
    assert_eq!(harness.store.read(ArtifactName::Echo).unwrap(), ECHO_BYTES);
    assert_eq!(
        *harness.transport.uploads.lock().unwrap(),
        vec![RECORDED_BYTES.to_vec()]
    );

    let playback = harness.playback.lock().unwrap();
    assert_eq!(playback.loaded_bytes, vec![ECHO_BYTES.to_vec()]);
    assert_eq!(playback.loads, vec![PlaybackRate::NORMAL]);
}

/// WHAT: Transport failure returns to idle without touching playback
/// WHY: Exchange failures are recovered locally so the user can retry
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_transport_failure_when_exchange_completes_then_recording_idle_and_playback_unchanged() {
    // Given: A ready recorder whose transport fails
    let mut harness = Harness::ready(Reply::TransportFailure);

    // When: A full record cycle runs
    harness.record_cycle().await;

    // Then: Recording idle, playback still disabled, failure surfaced, no echo written
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert_eq!(snapshot.playback, PlaybackState::Disabled);
    assert!(!snapshot.exchange_in_flight);
    assert_eq!(snapshot.last_failure, Some(FailureKind::TransportFailed));
    assert!(!harness.store.exists(ArtifactName::Echo));
    assert!(harness.playback.lock().unwrap().loads.is_empty());
}

/// WHAT: A failed exchange keeps the previous echo and its playback state
/// WHY: The echo artifact is only replaced after a fully successful exchange
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_previous_echo_when_next_exchange_fails_then_prior_echo_untouched() {
    // Given: One successful round trip
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Idle);

    // When: The next exchange fails to encode
    harness.transport.set_reply(Reply::EncodingFailure);
    harness.record_cycle().await;

    // Then: Prior echo and playback state survive
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.playback, PlaybackState::Idle);
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert_eq!(snapshot.last_failure, Some(FailureKind::EncodingFailed));
    assert_eq!(harness.store.read(ArtifactName::Echo).unwrap(), ECHO_BYTES);
    assert_eq!(harness.playback.lock().unwrap().loads.len(), 1);
}

/// WHAT: Playback load failure disables playback
/// WHY: An echo that cannot be played must not enable the play control
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unplayable_echo_when_exchange_succeeds_then_playback_disabled() {
    // Given: A playback device that rejects every load
    let mut harness = Harness::new(
        FakeCapture::granted(),
        FakePlayback {
            fail_load: true,
            ..FakePlayback::default()
        },
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();

    // When: A full record cycle runs
    harness.record_cycle().await;

    // Then: Echo persisted but playback disabled with the failure surfaced
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.playback, PlaybackState::Disabled);
    assert_eq!(snapshot.last_failure, Some(FailureKind::PlaybackPrepareFailed));
    assert_eq!(harness.store.read(ArtifactName::Echo).unwrap(), ECHO_BYTES);
}

/// WHAT: Capture stop failure skips the exchange
/// WHY: Uploading a half-written recording would echo garbage
#[test]
#[allow(clippy::unwrap_used)]
fn given_stop_failure_when_ending_recording_then_no_exchange_and_idle() {
    // Given: A capture that fails to stop
    let mut capture = FakeCapture::granted();
    capture.fail_stop = true;
    let mut harness = Harness::new(
        capture,
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();
    assert!(harness.controller.begin_recording());

    // When: Releasing the record control
    assert!(harness.controller.end_recording());

    // Then: Recorder idle, no exchange in flight, device failure surfaced
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert!(!snapshot.exchange_in_flight);
    assert_eq!(snapshot.last_failure, Some(FailureKind::Device));
}

/// WHAT: Capture start failure leaves the recorder idle
/// WHY: The user can press again once the device recovers
#[test]
#[allow(clippy::unwrap_used)]
fn given_start_failure_when_beginning_recording_then_stays_idle() {
    // Given: A capture that fails to start
    let mut capture = FakeCapture::granted();
    capture.fail_start = true;
    let mut harness = Harness::new(
        capture,
        FakePlayback::default(),
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();

    // When: Pressing record
    harness.controller.begin_recording();

    // Then: Still idle with the failure surfaced
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert_eq!(snapshot.last_failure, Some(FailureKind::Device));
}

/// WHAT: Finished playback returns to Idle, not Paused
/// WHY: Completion is distinct from a user pause
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_echo_when_playback_finishes_then_idle() {
    // Given: A loaded echo
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;

    // When: Toggle to play, then the device reports completion
    assert!(harness.controller.toggle_playback());
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Playing);
    harness.finish_playback();
    assert!(harness.controller.process_next().await);

    // Then: Playback back to Idle
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Idle);
    assert_eq!(harness.playback.lock().unwrap().plays, 1);
}

/// WHAT: Pause and resume keep the playback rate
/// WHY: Toggling must not reset speed
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_echo_when_toggled_twice_then_playing_again_with_same_rate() {
    // Given: A loaded echo at fast speed, playing
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert!(harness.controller.set_playback_rate(PlaybackRate::FAST));
    assert!(harness.controller.toggle_playback());

    // When: Pause, then resume
    assert!(harness.controller.toggle_playback());
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Paused);
    assert!(harness.controller.toggle_playback());

    // Then: Playing, rate unchanged, no further rate calls
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.playback, PlaybackState::Playing);
    assert_eq!(snapshot.rate, PlaybackRate::FAST);
    let log = harness.playback.lock().unwrap();
    assert_eq!(log.plays, 2);
    assert_eq!(log.pauses, 1);
    assert_eq!(log.rates, vec![PlaybackRate::FAST]);
}

/// WHAT: Toggle does nothing while playback is disabled
/// WHY: There is no echo to play yet
#[test]
#[allow(clippy::unwrap_used)]
fn given_disabled_playback_when_toggling_then_no_op() {
    // Given: A ready recorder with no echo yet
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));

    // When: Toggling playback
    let changed = harness.controller.toggle_playback();

    // Then: Nothing happens
    assert!(!changed);
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Disabled);
    assert_eq!(harness.playback.lock().unwrap().plays, 0);
}

/// WHAT: Setting the same rate twice applies one change
/// WHY: Rate updates are idempotent
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_loaded_echo_when_same_rate_set_twice_then_one_change_applied() {
    // Given: A loaded echo
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;

    // When: Switching to 1.5x twice
    let first = harness.controller.set_playback_rate(PlaybackRate::FAST);
    let second = harness.controller.set_playback_rate(PlaybackRate::FAST);

    // Then: One change reached the device, rate is 1.5x
    assert!(first);
    assert!(!second);
    assert_eq!(harness.controller.snapshot().rate, PlaybackRate::FAST);
    assert_eq!(
        harness.playback.lock().unwrap().rates,
        vec![PlaybackRate::FAST]
    );
}

/// WHAT: A rate the device refuses is not committed
/// WHY: Asking again for the same speed must reach the device, not the no-op guard
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_device_rejecting_rate_when_setting_rate_then_previous_rate_kept() {
    // Given: A loaded echo on a device that fails rate changes
    let mut harness = Harness::new(
        FakeCapture::granted(),
        FakePlayback {
            fail_set_rate: true,
            ..FakePlayback::default()
        },
        FakeTransport::replying(Reply::Echo(ECHO_BYTES.to_vec())),
    );
    harness.controller.initialize();
    harness.record_cycle().await;

    // When: Switching to 1.5x twice
    let first = harness.controller.set_playback_rate(PlaybackRate::FAST);
    let second = harness.controller.set_playback_rate(PlaybackRate::FAST);

    // Then: Both attempts rejected, rate stays normal, failure surfaced
    assert!(!first);
    assert!(!second);
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.rate, PlaybackRate::NORMAL);
    assert_eq!(snapshot.last_failure, Some(FailureKind::Device));
}

/// WHAT: Rate chosen before any echo exists is used when the echo loads
/// WHY: The rate applies to future playback as well
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_rate_set_before_echo_when_echo_loads_then_loaded_at_that_rate() {
    // Given: Fast speed selected with playback disabled
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    assert!(harness.controller.set_playback_rate(PlaybackRate::FAST));

    // When: A round trip completes
    harness.record_cycle().await;

    // Then: Loaded at 1.5x without a separate rate call
    let log = harness.playback.lock().unwrap();
    assert_eq!(log.loads, vec![PlaybackRate::FAST]);
    assert!(log.rates.is_empty());
}

/// WHAT: A second press or release while an exchange is in flight is rejected
/// WHY: In-flight operations are never queued or interleaved
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_exchange_in_flight_when_pressing_again_then_rejected() {
    // Given: A transport that holds the exchange open
    let gate = Arc::new(Notify::new());
    let mut harness = Harness::new(
        FakeCapture::granted(),
        FakePlayback::default(),
        FakeTransport::gated(Reply::Echo(ECHO_BYTES.to_vec()), Arc::clone(&gate)),
    );
    harness.controller.initialize();
    assert!(harness.controller.begin_recording());
    assert!(harness.controller.end_recording());

    // When: Press and release again before the exchange completes
    let begin = harness.controller.begin_recording();
    let end = harness.controller.end_recording();

    // Then: Both rejected, capture started once
    assert!(!begin);
    assert!(!end);
    assert!(harness.controller.snapshot().exchange_in_flight);
    assert_eq!(harness.capture.lock().unwrap().starts, 1);

    // When: The exchange is released
    gate.notify_one();
    assert!(harness.controller.process_next().await);

    // Then: Recording is possible again
    assert!(harness.controller.begin_recording());
    assert_eq!(harness.transport.upload_count(), 1);
}

/// WHAT: Pressing record while an echo plays is rejected
/// WHY: Recording must not interrupt audio mid-playback
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_playing_echo_when_recording_begins_then_rejected_and_playback_untouched() {
    // Given: An echo playing
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert!(harness.controller.toggle_playback());

    // When: Pressing record
    let accepted = harness.controller.begin_recording();

    // Then: Rejected, still playing, capture never started for it
    assert!(!accepted);
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert_eq!(snapshot.playback, PlaybackState::Playing);
    assert_eq!(harness.playback.lock().unwrap().stops, 0);
    assert_eq!(harness.capture.lock().unwrap().starts, 1);
}

/// WHAT: Pressing record while an echo is paused is rejected
/// WHY: A paused clip resumes where it stopped, so it is left alone too
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_paused_echo_when_recording_begins_then_rejected_and_still_paused() {
    // Given: An echo paused mid-clip
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert!(harness.controller.toggle_playback());
    assert!(harness.controller.toggle_playback());

    // When: Pressing record
    let accepted = harness.controller.begin_recording();

    // Then: Rejected, still paused, nothing stopped
    assert!(!accepted);
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.recording, RecordingState::Idle);
    assert_eq!(snapshot.playback, PlaybackState::Paused);
    assert_eq!(harness.playback.lock().unwrap().stops, 0);

    // When: The clip is played to the end
    assert!(harness.controller.toggle_playback());
    harness.finish_playback();
    assert!(harness.controller.process_next().await);

    // Then: Recording is accepted again
    assert!(harness.controller.begin_recording());
}

/// WHAT: Playback cannot start while recording
/// WHY: Recording and playing must never overlap
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_toggling_playback_then_rejected() {
    // Given: A loaded echo and a new recording underway
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert!(harness.controller.begin_recording());

    // When: Toggling playback
    let changed = harness.controller.toggle_playback();

    // Then: Rejected, playback untouched
    assert!(!changed);
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Idle);
    assert_eq!(harness.playback.lock().unwrap().plays, 0);
}

/// WHAT: A new echo arriving during playback stops the old clip before replacing it
/// WHY: The artifact must not be rewritten while the device reads it
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_echo_playing_when_new_exchange_succeeds_then_old_clip_stopped_and_replaced() {
    // Given: A gated second exchange and the first echo playing
    let gate = Arc::new(Notify::new());
    let mut harness = Harness::new(
        FakeCapture::granted(),
        FakePlayback::default(),
        FakeTransport::gated(Reply::Echo(ECHO_BYTES.to_vec()), Arc::clone(&gate)),
    );
    harness.controller.initialize();
    gate.notify_one();
    harness.record_cycle().await;

    assert!(harness.controller.begin_recording());
    assert!(harness.controller.end_recording());
    assert!(harness.controller.toggle_playback());
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Playing);

    // When: The second exchange returns different bytes
    harness.transport.set_reply(Reply::Echo(vec![0x09]));
    gate.notify_one();
    assert!(harness.controller.process_next().await);

    // Then: Old clip stopped, new echo persisted and loaded, playback idle
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Idle);
    assert_eq!(harness.store.read(ArtifactName::Echo).unwrap(), vec![0x09]);
    let log = harness.playback.lock().unwrap();
    assert_eq!(log.stops, 1);
    assert_eq!(log.loaded_bytes.last().unwrap(), &vec![0x09]);
}

/// WHAT: Finished signals from a replaced clip are ignored
/// WHY: A stale completion must not stop the new clip's playback state
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_reloaded_echo_when_old_finished_signal_arrives_then_ignored() {
    // Given: Two round trips, keeping the first load's signal
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    let stale = harness.playback.lock().unwrap().finished.clone().unwrap();
    harness.record_cycle().await;
    assert!(harness.controller.toggle_playback());

    // When: The first load's completion fires
    stale.notify();
    assert!(harness.controller.process_next().await);

    // Then: Still playing the new clip
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Playing);
}

/// WHAT: Finished signal while paused is ignored
/// WHY: Only a playing clip can finish
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_paused_echo_when_finished_signal_arrives_then_stays_paused() {
    // Given: A paused clip
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    harness.record_cycle().await;
    assert!(harness.controller.toggle_playback());
    assert!(harness.controller.toggle_playback());

    // When: A completion arrives
    harness.finish_playback();
    assert!(harness.controller.process_next().await);

    // Then: Still paused
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Paused);
}

/// WHAT: Subscribers observe every state change
/// WHY: Presentation layers render from snapshots, not from the controller
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_subscriber_when_recording_begins_then_snapshot_published() {
    // Given: A ready controller and a subscriber
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    let mut rx = harness.controller.subscribe();
    rx.borrow_and_update();

    // When: Recording begins
    assert!(harness.controller.begin_recording());

    // Then: The subscriber sees Recording
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().recording, RecordingState::Recording);
}

/// WHAT: Handle commands are applied in order by the event loop
/// WHY: User surfaces only talk to the controller through its queue
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_handle_commands_when_processed_then_applied_in_order_until_shutdown() {
    // Given: A ready controller and its handle
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
    let handle = harness.controller.handle();

    // When: Press, release, then shutdown are queued
    handle.begin_recording().unwrap();
    handle.end_recording().unwrap();
    handle.set_playback_rate(PlaybackRate::FAST).unwrap();

    assert!(harness.controller.process_next().await);
    assert_eq!(
        harness.controller.snapshot().recording,
        RecordingState::Recording
    );
    assert!(harness.controller.process_next().await);
    assert!(harness.controller.process_next().await);
    assert!(harness.controller.process_next().await);
    handle.shutdown().unwrap();

    // Then: Exchange completed, rate applied, and shutdown ends the loop
    let snapshot = harness.controller.snapshot();
    assert_eq!(snapshot.playback, PlaybackState::Idle);
    assert_eq!(snapshot.rate, PlaybackRate::FAST);
    assert!(!harness.controller.process_next().await);
}

/// WHAT: Stale exchange completions are ignored
/// WHY: Only the in-flight cycle may change playback state
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_exchange_in_flight_when_completion_arrives_then_ignored() {
    // Given: A ready controller with nothing in flight
    let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));

    // When: An unsolicited completion is handled
    let running = harness.controller.handle_event(SessionEvent::ExchangeCompleted {
        cycle_id: uuid::Uuid::new_v4(),
        outcome: Ok(ECHO_BYTES.to_vec()),
    });

    // Then: Nothing written, playback still disabled
    assert!(running);
    assert_eq!(harness.controller.snapshot().playback, PlaybackState::Disabled);
    assert!(!harness.store.exists(ArtifactName::Echo));
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Begin,
    End,
    Toggle,
    Finish,
    Rate,
    Settle,
}

const OPS: [Op; 6] = [
    Op::Begin,
    Op::End,
    Op::Toggle,
    Op::Finish,
    Op::Rate,
    Op::Settle,
];

/// WHAT: Recording never overlaps with playing or paused playback
/// WHY: Core invariant across every ordering of user and device events
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_any_event_sequence_when_applied_then_recording_never_overlaps_playback() {
    // Given: Every sequence of four operations, preceded by one round trip
    for index in 0..OPS.len().pow(4) {
        let mut harness = Harness::ready(Reply::Echo(ECHO_BYTES.to_vec()));
        harness.record_cycle().await;

        let mut remaining = index;
        let mut sequence = Vec::new();
        for _ in 0..4 {
            sequence.push(OPS[remaining % OPS.len()]);
            remaining /= OPS.len();
        }

        // When: Applying the sequence
        for op in &sequence {
            match op {
                Op::Begin => {
                    harness.controller.begin_recording();
                }
                Op::End => {
                    harness.controller.end_recording();
                }
                Op::Toggle => {
                    harness.controller.toggle_playback();
                }
                Op::Finish => {
                    harness.finish_playback();
                    harness.controller.process_next().await;
                }
                Op::Rate => {
                    harness.controller.set_playback_rate(PlaybackRate::FAST);
                }
                Op::Settle => {
                    if harness.controller.snapshot().exchange_in_flight {
                        harness.controller.process_next().await;
                    }
                }
            }

            // Then: The invariant holds after every event
            let snapshot = harness.controller.snapshot();
            assert!(
                !(snapshot.recording == RecordingState::Recording
                    && snapshot.playback.is_active()),
                "overlap after {:?}: {:?}",
                sequence,
                snapshot
            );
        }
    }
}
