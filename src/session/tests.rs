//! Unit tests for the session/rate controller

use super::*;
use chrono::TimeZone;
use rust_decimal_macros::dec;

fn make_config() -> SessionConfig {
    SessionConfig {
        max_signals_per_hour: 2,
        utc_offset_hours: -4,
        blackout_start_hour: 0,
        blackout_end_hour: 6,
        hourly_profit_target: dec!(50),
        hourly_stop_loss: dec!(100),
        standby_cold_reds: 2,
        standby_secs: 120,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::west_opt(4 * 3600).unwrap();
    offset
        .with_ymd_and_hms(2026, 8, 30, hour, minute, 0)
        .unwrap()
}

#[test]
fn test_hour_and_date_keys() {
    let clock = LocalClock::new(&make_config());
    let now = at(14, 37);
    assert_eq!(clock.hour_key(now), "2026-08-30 14");
    assert_eq!(clock.date_key(now), "2026-08-30");
}

#[test]
fn test_blackout_window() {
    let clock = LocalClock::new(&make_config());
    assert!(clock.in_blackout(at(0, 0)));
    assert!(clock.in_blackout(at(3, 30)));
    assert!(clock.in_blackout(at(5, 59)));
    assert!(!clock.in_blackout(at(6, 0)));
    assert!(!clock.in_blackout(at(14, 0)));
    assert!(!clock.in_blackout(at(23, 59)));
}

#[test]
fn test_blackout_wraps_midnight() {
    let mut config = make_config();
    config.blackout_start_hour = 22;
    config.blackout_end_hour = 2;
    let clock = LocalClock::new(&config);
    assert!(clock.in_blackout(at(23, 0)));
    assert!(clock.in_blackout(at(1, 0)));
    assert!(!clock.in_blackout(at(2, 0)));
    assert!(!clock.in_blackout(at(12, 0)));
}

#[test]
fn test_blackout_disabled_when_start_equals_end() {
    let mut config = make_config();
    config.blackout_start_hour = 0;
    config.blackout_end_hour = 0;
    let clock = LocalClock::new(&config);
    assert!(!clock.in_blackout(at(0, 0)));
    assert!(!clock.in_blackout(at(12, 0)));
}

#[test]
fn test_out_of_range_offset_clamped() {
    let mut config = make_config();
    config.utc_offset_hours = 99;
    let clock = LocalClock::new(&config);
    // Clamped to +14, the widest real offset
    assert_eq!(clock.now().offset().local_minus_utc(), 14 * 3600);

    config.utc_offset_hours = -99;
    let clock = LocalClock::new(&config);
    assert_eq!(clock.now().offset().local_minus_utc(), -12 * 3600);
}

#[test]
fn test_status_label() {
    let clock = LocalClock::new(&make_config());
    assert_eq!(clock.status_label(at(3, 0)), "ANALYZING (blackout window)");
    assert_eq!(clock.status_label(at(14, 0)), "OPERATING");
}

#[test]
fn test_quota_per_subscriber_per_hour() {
    let session = SessionController::new(make_config());
    let now = at(14, 0);

    assert!(session.try_acquire_signal(1, now));
    assert!(session.try_acquire_signal(1, now));
    assert!(!session.try_acquire_signal(1, now));
    assert_eq!(session.signals_this_hour(1, now), 2);

    // Counters are per subscriber
    assert!(session.try_acquire_signal(2, now));
    assert_eq!(session.signals_this_hour(2, now), 1);
}

#[test]
fn test_quota_resets_on_new_hour() {
    let session = SessionController::new(make_config());

    assert!(session.try_acquire_signal(1, at(14, 0)));
    assert!(session.try_acquire_signal(1, at(14, 59)));
    assert!(!session.try_acquire_signal(1, at(14, 59)));

    let next_hour = at(15, 0);
    assert_eq!(session.signals_this_hour(1, next_hour), 0);
    assert!(session.try_acquire_signal(1, next_hour));
}

#[test]
fn test_hourly_brake_engages_on_target() {
    let session = SessionController::new(make_config());
    let now = at(14, 0);

    session.record_profit(now, dec!(30));
    assert!(!session.hourly_paused(now));
    session.record_profit(now, dec!(25));
    assert_eq!(session.hourly_profit(now), dec!(55));
    assert!(session.hourly_paused(now));
}

#[test]
fn test_hourly_brake_engages_on_stop() {
    let session = SessionController::new(make_config());
    let now = at(14, 0);

    session.record_profit(now, dec!(-60));
    assert!(!session.hourly_paused(now));
    session.record_profit(now, dec!(-45));
    assert!(session.hourly_paused(now));
}

#[test]
fn test_standby_engages_at_threshold_and_expires() {
    let session = SessionController::new(make_config());
    let start = at(14, 0);

    // Below the configured threshold of 2 reds: nothing happens
    assert!(!session.maybe_engage_standby(1, 1, start));
    assert!(!session.in_standby(1, start));

    assert!(session.maybe_engage_standby(1, 2, start));
    assert!(session.in_standby(1, start));
    assert!(session.in_standby(1, at(14, 1)));
    // 120 seconds later the standby has run out
    assert!(!session.in_standby(1, at(14, 3)));

    // Other subscribers are unaffected
    assert!(!session.in_standby(2, start));
}

#[test]
fn test_standby_disabled_at_zero_threshold() {
    let mut config = make_config();
    config.standby_cold_reds = 0;
    let session = SessionController::new(config);
    assert!(!session.maybe_engage_standby(1, 50, at(14, 0)));
    assert!(!session.in_standby(1, at(14, 0)));
}

#[test]
fn test_hourly_brake_clears_on_new_hour() {
    let session = SessionController::new(make_config());

    session.record_profit(at(14, 10), dec!(80));
    assert!(session.hourly_paused(at(14, 30)));

    let next_hour = at(15, 0);
    assert!(!session.hourly_paused(next_hour));
    assert_eq!(session.hourly_profit(next_hour), dec!(0));
}
