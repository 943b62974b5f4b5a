/*!
 * Tests for the token-bucket throttle
 */

use std::time::{Duration, Instant};

use srtt::errors::TranslationError;
use srtt::translation::Throttle;

/// Test that a zero interval is rejected
#[test]
fn test_new_withZeroInterval_shouldFail() {
    let result = Throttle::new(3, Duration::ZERO);
    assert!(matches!(result, Err(TranslationError::InvalidThrottle(_))));
}

/// Test that unset settings disable the throttle
#[test]
fn test_from_settings_withZeroPermits_shouldDisable() -> anyhow::Result<()> {
    assert!(Throttle::from_settings(0, 60)?.is_none());
    assert!(Throttle::from_settings(0, 0)?.is_none());

    let throttle = Throttle::from_settings(2, 30)?.expect("throttle enabled");
    assert_eq!(throttle.permits(), 2);
    assert_eq!(throttle.interval(), Duration::from_secs(30));
    Ok(())
}

/// Test that the burst is free and the next dispatch waits one interval
#[test]
fn test_reserve_at_afterBurst_shouldDelayByInterval() -> anyhow::Result<()> {
    let throttle = Throttle::new(2, Duration::from_secs(1))?;
    let now = Instant::now();

    assert_eq!(throttle.reserve_at(now), Duration::ZERO);
    assert_eq!(throttle.reserve_at(now), Duration::ZERO);
    assert_eq!(throttle.reserve_at(now), Duration::from_secs(1));
    assert_eq!(throttle.reserve_at(now), Duration::from_secs(2));
    Ok(())
}

/// Test that waiting half an interval halves the delay
#[test]
fn test_reserve_at_afterPartialRefill_shouldShortenDelay() -> anyhow::Result<()> {
    let throttle = Throttle::new(1, Duration::from_secs(1))?;
    let now = Instant::now();

    assert_eq!(throttle.reserve_at(now), Duration::ZERO);
    let wait = throttle.reserve_at(now + Duration::from_millis(500));
    assert_eq!(wait, Duration::from_millis(500));
    Ok(())
}

/// Test that delayed dispatches never exceed the permitted rate
#[test]
fn test_reserve_at_steadyLoad_shouldSpaceDispatchesByInterval() -> anyhow::Result<()> {
    let interval = Duration::from_secs(2);
    let throttle = Throttle::new(1, interval)?;
    let start = Instant::now();

    let mut dispatch_times = Vec::new();
    for _ in 0..5 {
        let wait = throttle.reserve_at(start);
        dispatch_times.push(wait);
    }

    for pair in dispatch_times.windows(2) {
        assert_eq!(pair[1] - pair[0], interval);
    }
    Ok(())
}
