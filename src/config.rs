//! Configuration loading
//!
//! All tunables live in `config.toml`, with `ROULETTE_BOT_*` environment
//! overrides. Every threshold the strategy and stake manager use is
//! configuration, not a hard-coded constant.

use crate::error::{BotError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub stake: StakeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Telegram is optional: without it the bot runs headless (logs only).
    pub telegram: Option<TelegramConfig>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ROULETTE_BOT")
                    .separator("__"),
            )
            .build()
            .map_err(|e| BotError::Config(e.to_string()))?;

        cfg.try_deserialize()
            .map_err(|e| BotError::Config(e.to_string()))
    }
}

/// Roulette result feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Seconds between polls of the feed.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Request timeout; on expiry the cycle is skipped, not failed.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
    /// Backoff after a caught fault in the collector loop.
    #[serde(default = "default_fault_backoff")]
    pub fault_backoff_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_feed_timeout(),
            fault_backoff_secs: default_fault_backoff(),
        }
    }
}

/// Adaptive decision engine tunables.
///
/// The confidence formula and the chaotic threshold are heuristics carried
/// over as-is; they make no statistical claim.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Spins analyzed per decision.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Streak length at which the engine flips to the reversal bet.
    #[serde(default = "default_streak_trigger")]
    pub streak_trigger: usize,
    /// Spins retained in history (must exceed `window_size + 2`).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Chi-square below this plus no streak means chaotic.
    #[serde(default = "default_chaotic_threshold")]
    pub chaotic_threshold: f64,
    /// Cap on the streak bonus added to confidence.
    #[serde(default = "default_streak_bonus_cap")]
    pub streak_bonus_cap: f64,
    /// Minimum confidence to issue a signal at all.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Seconds between decision attempts per subscriber.
    #[serde(default = "default_decision_interval")]
    pub decision_interval_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            streak_trigger: default_streak_trigger(),
            history_capacity: default_history_capacity(),
            chaotic_threshold: default_chaotic_threshold(),
            streak_bonus_cap: default_streak_bonus_cap(),
            confidence_threshold: default_confidence_threshold(),
            decision_interval_secs: default_decision_interval(),
        }
    }
}

/// Stake sizing, martingale bounds and per-subscriber day limits.
#[derive(Debug, Clone, Deserialize)]
pub struct StakeConfig {
    /// Column stake as a fraction of the current bankroll.
    #[serde(default = "default_base_stake_pct")]
    pub base_stake_pct: Decimal,
    /// Zero cover stake as a fraction of the current bankroll.
    #[serde(default = "default_zero_stake_pct")]
    pub zero_stake_pct: Decimal,
    /// Stake multiplier per escalation step.
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
    /// Escalation step cap.
    #[serde(default = "default_max_escalation_step")]
    pub max_escalation_step: u32,
    /// Minimum confidence for a loss to escalate the next stake.
    #[serde(default = "default_escalation_confidence")]
    pub escalation_confidence: f64,
    /// Smallest bankroll accepted at registration.
    #[serde(default = "default_min_bankroll")]
    pub min_bankroll: Decimal,
    /// Daily target = starting bankroll times this.
    #[serde(default = "default_daily_target_mult")]
    pub daily_target_mult: Decimal,
    /// Daily stop = starting bankroll times this.
    #[serde(default = "default_stop_loss_fraction")]
    pub stop_loss_fraction: Decimal,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            base_stake_pct: default_base_stake_pct(),
            zero_stake_pct: default_zero_stake_pct(),
            multiplier: default_multiplier(),
            max_escalation_step: default_max_escalation_step(),
            escalation_confidence: default_escalation_confidence(),
            min_bankroll: default_min_bankroll(),
            daily_target_mult: default_daily_target_mult(),
            stop_loss_fraction: default_stop_loss_fraction(),
        }
    }
}

/// Session pacing: hourly quota, blackout window, hourly profit brake.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_signals_per_hour")]
    pub max_signals_per_hour: u32,
    /// Fixed offset from UTC in hours, no DST. Default is Manaus (-4).
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// No new signals from this local hour (inclusive)...
    #[serde(default = "default_blackout_start_hour")]
    pub blackout_start_hour: u32,
    /// ...to this local hour (exclusive).
    #[serde(default = "default_blackout_end_hour")]
    pub blackout_end_hour: u32,
    /// Aggregate hourly profit at which signaling pauses for the hour.
    #[serde(default = "default_hourly_profit_target")]
    pub hourly_profit_target: Decimal,
    /// Aggregate hourly loss at which signaling pauses for the hour.
    #[serde(default = "default_hourly_stop_loss")]
    pub hourly_stop_loss: Decimal,
    /// Consecutive reds that put a subscriber on standby. Zero disables.
    #[serde(default = "default_standby_cold_reds")]
    pub standby_cold_reds: u32,
    /// Standby duration in seconds.
    #[serde(default = "default_standby_secs")]
    pub standby_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_signals_per_hour: default_max_signals_per_hour(),
            utc_offset_hours: default_utc_offset_hours(),
            blackout_start_hour: default_blackout_start_hour(),
            blackout_end_hour: default_blackout_end_hour(),
            hourly_profit_target: default_hourly_profit_target(),
            hourly_stop_loss: default_hourly_stop_loss(),
            standby_cold_reds: default_standby_cold_reds(),
            standby_secs: default_standby_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_true")]
    pub notify_signals: bool,
    #[serde(default = "default_true")]
    pub notify_settlements: bool,
    #[serde(default = "default_true")]
    pub notify_errors: bool,
}

fn default_feed_url() -> String {
    "https://api.casinoscores.com/svc-evolution-stats/stats/auto-roulette".to_string()
}

fn default_poll_interval() -> u64 {
    20
}

fn default_feed_timeout() -> u64 {
    15
}

fn default_fault_backoff() -> u64 {
    10
}

fn default_window_size() -> usize {
    20
}

fn default_streak_trigger() -> usize {
    6
}

fn default_history_capacity() -> usize {
    64
}

fn default_chaotic_threshold() -> f64 {
    0.35
}

fn default_streak_bonus_cap() -> f64 {
    0.10
}

fn default_confidence_threshold() -> f64 {
    0.75
}

fn default_decision_interval() -> u64 {
    20
}

fn default_base_stake_pct() -> Decimal {
    dec!(0.05)
}

fn default_zero_stake_pct() -> Decimal {
    dec!(0.01)
}

fn default_multiplier() -> Decimal {
    dec!(2.0)
}

fn default_max_escalation_step() -> u32 {
    3
}

fn default_escalation_confidence() -> f64 {
    0.80
}

fn default_min_bankroll() -> Decimal {
    dec!(10)
}

fn default_daily_target_mult() -> Decimal {
    dec!(2.0)
}

fn default_stop_loss_fraction() -> Decimal {
    dec!(0.5)
}

fn default_max_signals_per_hour() -> u32 {
    2
}

fn default_utc_offset_hours() -> i32 {
    -4
}

fn default_blackout_start_hour() -> u32 {
    0
}

fn default_blackout_end_hour() -> u32 {
    6
}

fn default_hourly_profit_target() -> Decimal {
    dec!(50)
}

fn default_hourly_stop_loss() -> Decimal {
    dec!(100)
}

fn default_standby_cold_reds() -> u32 {
    2
}

fn default_standby_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}
