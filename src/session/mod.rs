//! Session pacing
//!
//! Everything time-gated lives here: the fixed-offset local clock, the
//! analysis blackout window, the shared hourly profit window with its
//! pause flag, and the per-subscriber signals-per-hour quota.

#[cfg(test)]
mod tests;

use crate::config::SessionConfig;
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Wall clock at a fixed offset from UTC. No DST rules.
#[derive(Debug, Clone)]
pub struct LocalClock {
    offset: FixedOffset,
    blackout_start_hour: u32,
    blackout_end_hour: u32,
}

impl LocalClock {
    pub fn new(config: &SessionConfig) -> Self {
        // Offsets outside the real-world range are clamped into it.
        let secs = config.utc_offset_hours.clamp(-12, 14) * 3600;
        let offset = FixedOffset::east_opt(secs)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self {
            offset,
            blackout_start_hour: config.blackout_start_hour,
            blackout_end_hour: config.blackout_end_hour,
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Key identifying the current local hour, e.g. `2026-08-30 14`.
    pub fn hour_key(&self, now: DateTime<FixedOffset>) -> String {
        now.format("%Y-%m-%d %H").to_string()
    }

    /// Key identifying the current local day.
    pub fn date_key(&self, now: DateTime<FixedOffset>) -> String {
        now.format("%Y-%m-%d").to_string()
    }

    /// True inside the no-signal analysis window. A window whose start is
    /// after its end wraps across midnight.
    pub fn in_blackout(&self, now: DateTime<FixedOffset>) -> bool {
        let hour = now.hour();
        if self.blackout_start_hour == self.blackout_end_hour {
            return false;
        }
        if self.blackout_start_hour < self.blackout_end_hour {
            hour >= self.blackout_start_hour && hour < self.blackout_end_hour
        } else {
            hour >= self.blackout_start_hour || hour < self.blackout_end_hour
        }
    }

    pub fn status_label(&self, now: DateTime<FixedOffset>) -> &'static str {
        if self.in_blackout(now) {
            "ANALYZING (blackout window)"
        } else {
            "OPERATING"
        }
    }
}

/// Process-wide hourly profit accumulator with a pause flag.
///
/// Resets itself whenever the hour key changes; the pause therefore never
/// outlives the hour that set it.
#[derive(Debug, Default)]
struct HourlyWindow {
    hour_key: String,
    profit: Decimal,
    paused: bool,
}

impl HourlyWindow {
    fn roll(&mut self, hour_key: &str) {
        if self.hour_key != hour_key {
            self.hour_key = hour_key.to_string();
            self.profit = Decimal::ZERO;
            self.paused = false;
        }
    }
}

/// Per-subscriber signals-per-hour quota. Requests beyond the quota are
/// rejected, not queued.
#[derive(Debug, Default)]
struct RateCounters {
    counters: HashMap<i64, (String, u32)>,
}

impl RateCounters {
    fn try_acquire(&mut self, chat_id: i64, hour_key: &str, max: u32) -> bool {
        let entry = self.counters.entry(chat_id).or_default();
        if entry.0 != hour_key {
            *entry = (hour_key.to_string(), 0);
        }
        if entry.1 >= max {
            return false;
        }
        entry.1 += 1;
        true
    }

    fn count(&self, chat_id: i64, hour_key: &str) -> u32 {
        match self.counters.get(&chat_id) {
            Some((key, n)) if key == hour_key => *n,
            _ => 0,
        }
    }
}

/// Shared session/rate controller.
pub struct SessionController {
    config: SessionConfig,
    clock: LocalClock,
    hourly: Mutex<HourlyWindow>,
    rate: Mutex<RateCounters>,
    /// Per-subscriber cold-table standby expiry.
    standby: Mutex<HashMap<i64, DateTime<FixedOffset>>>,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let clock = LocalClock::new(&config);
        Self {
            config,
            clock,
            hourly: Mutex::new(HourlyWindow::default()),
            rate: Mutex::new(RateCounters::default()),
            standby: Mutex::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    pub fn in_blackout(&self, now: DateTime<FixedOffset>) -> bool {
        self.clock.in_blackout(now)
    }

    /// Whether the shared hourly profit brake is engaged for this hour.
    pub fn hourly_paused(&self, now: DateTime<FixedOffset>) -> bool {
        let key = self.clock.hour_key(now);
        let mut window = self.hourly.lock();
        window.roll(&key);
        window.paused
    }

    /// Accumulates settled profit into the hourly window and engages the
    /// pause once the hour crosses the target or the stop.
    pub fn record_profit(&self, now: DateTime<FixedOffset>, delta: Decimal) {
        let key = self.clock.hour_key(now);
        let mut window = self.hourly.lock();
        window.roll(&key);
        window.profit += delta;
        if window.profit >= self.config.hourly_profit_target
            || window.profit <= -self.config.hourly_stop_loss
        {
            if !window.paused {
                tracing::info!(
                    profit = %window.profit,
                    "hourly brake engaged, pausing signals for this hour"
                );
            }
            window.paused = true;
        }
    }

    pub fn hourly_profit(&self, now: DateTime<FixedOffset>) -> Decimal {
        let key = self.clock.hour_key(now);
        let mut window = self.hourly.lock();
        window.roll(&key);
        window.profit
    }

    /// Consumes one slot of the subscriber's hourly quota. False when the
    /// quota for this hour is exhausted.
    pub fn try_acquire_signal(&self, chat_id: i64, now: DateTime<FixedOffset>) -> bool {
        let key = self.clock.hour_key(now);
        self.rate
            .lock()
            .try_acquire(chat_id, &key, self.config.max_signals_per_hour)
    }

    /// Puts the subscriber on standby when their consecutive-red count has
    /// reached the configured threshold. Returns whether a standby was
    /// engaged by this call. A threshold of zero disables the feature.
    pub fn maybe_engage_standby(
        &self,
        chat_id: i64,
        reds_row: u32,
        now: DateTime<FixedOffset>,
    ) -> bool {
        if self.config.standby_cold_reds == 0 || reds_row < self.config.standby_cold_reds {
            return false;
        }
        let until = now + chrono::Duration::seconds(self.config.standby_secs as i64);
        self.standby.lock().insert(chat_id, until);
        tracing::info!(
            chat_id,
            reds_row,
            secs = self.config.standby_secs,
            "cold table, subscriber on standby"
        );
        true
    }

    /// Whether the subscriber's cold-table standby is still running.
    pub fn in_standby(&self, chat_id: i64, now: DateTime<FixedOffset>) -> bool {
        match self.standby.lock().get(&chat_id) {
            Some(until) => now < *until,
            None => false,
        }
    }

    pub fn standby_secs(&self) -> u64 {
        self.config.standby_secs
    }

    pub fn signals_this_hour(&self, chat_id: i64, now: DateTime<FixedOffset>) -> u32 {
        let key = self.clock.hour_key(now);
        self.rate.lock().count(chat_id, &key)
    }

    pub fn max_signals_per_hour(&self) -> u32 {
        self.config.max_signals_per_hour
    }
}
