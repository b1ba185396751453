use crate::{PlaybackRate, PlaybackState, SessionError};

/// WHAT: Positive finite rates are accepted
/// WHY: Config and console supply arbitrary floats
#[test]
#[allow(clippy::unwrap_used)]
fn given_positive_rate_when_validated_then_accepted() {
    // Given/When: A valid multiplier
    let rate = PlaybackRate::new(1.25).unwrap();

    // Then: Value preserved and displayed as a multiplier
    assert_eq!(rate.get(), 1.25);
    assert_eq!(rate.to_string(), "1.25x");
}

/// WHAT: Zero, negative and non-finite rates are rejected
/// WHY: A playback rate must always be usable by the device
#[test]
fn given_invalid_rates_when_validated_then_rejected() {
    for value in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        // When: Validating
        let result = PlaybackRate::new(value);

        // Then: InvalidPlaybackRate
        assert!(
            matches!(result, Err(SessionError::InvalidPlaybackRate { .. })),
            "rate {} should be rejected",
            value
        );
    }
}

#[test]
fn given_default_rate_then_normal_speed() {
    assert_eq!(PlaybackRate::default(), PlaybackRate::NORMAL);
    assert_eq!(PlaybackRate::NORMAL.to_string(), "1x");
    assert_eq!(PlaybackRate::FAST.get(), 1.5);
}

/// WHAT: Only Playing and Paused count as active playback
/// WHY: Active playback is what recording must stop first
#[test]
fn given_playback_states_when_checking_active_then_only_playing_and_paused() {
    assert!(!PlaybackState::Disabled.is_active());
    assert!(!PlaybackState::Idle.is_active());
    assert!(PlaybackState::Playing.is_active());
    assert!(PlaybackState::Paused.is_active());
}
