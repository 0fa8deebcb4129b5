//! Stake and bankroll management
//!
//! Owns every per-subscriber mutable record: bankroll, daily target and
//! stop, martingale escalation step, the single in-flight pending signal,
//! and the daily win/red counters. Settlement of a pending signal is driven
//! by the next distinct spin from the feed, never the spin that produced it.


use crate::config::StakeConfig;
use crate::session::SessionController;
use crate::types::{
    Column, DeactivationReason, Decision, Settlement, SettlementOutcome, Spin, StakePlan,
};
use chrono::{DateTime, FixedOffset};
use parking_lot::{Mutex, RwLock};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::HashMap;

/// The one in-flight signal a subscriber may have.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSignal {
    pub play: [Column; 2],
    pub column_stake: Decimal,
    pub zero_stake: Decimal,
    pub escalation_authorized: bool,
    /// History sequence number at proposal time. Settlement requires a
    /// spin with a strictly greater sequence, so a signal can never be
    /// graded against a spin its decision already saw.
    pub history_seq: u64,
}

/// Per-chat subscriber record. Lives for the process lifetime or until
/// re-registration.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub chat_id: i64,
    pub start_bank: Decimal,
    pub bank: Decimal,
    /// Daily target: start bank times the configured multiplier.
    pub target: Decimal,
    /// Daily stop: start bank times the configured fraction.
    pub stop: Decimal,
    pub escalation_step: u32,
    pub pending: Option<PendingSignal>,
    pub active: bool,
    pub wins_today: u32,
    pub reds_today: u32,
    pub signals_today: u32,
    /// Consecutive losses with no win in between; drives the cold-table
    /// standby.
    pub reds_row: u32,
}

impl Subscriber {
    fn new(chat_id: i64, start_bank: Decimal, config: &StakeConfig) -> Self {
        Self {
            chat_id,
            start_bank,
            bank: start_bank,
            target: start_bank * config.daily_target_mult,
            stop: start_bank * config.stop_loss_fraction,
            escalation_step: 0,
            pending: None,
            active: true,
            wins_today: 0,
            reds_today: 0,
            signals_today: 0,
            reds_row: 0,
        }
    }
}

/// Scales a base stake by `multiplier^step`.
pub fn scaled_stake(base: Decimal, multiplier: Decimal, step: u32) -> Decimal {
    if step == 0 {
        return base;
    }
    base * multiplier.powi(step as i64)
}

/// The subscriber table plus the stake/settlement rules applied to it.
pub struct SubscriberBook {
    config: StakeConfig,
    confidence_threshold: f64,
    subscribers: RwLock<HashMap<i64, Subscriber>>,
    current_day: Mutex<String>,
}

impl SubscriberBook {
    pub fn new(config: StakeConfig, confidence_threshold: f64) -> Self {
        Self {
            config,
            confidence_threshold,
            subscribers: RwLock::new(HashMap::new()),
            current_day: Mutex::new(String::new()),
        }
    }

    /// Registers (or re-registers) a subscriber. Invalid input mutates
    /// nothing.
    pub fn register(&self, chat_id: i64, start_bank: Decimal) -> crate::error::Result<Subscriber> {
        if start_bank <= Decimal::ZERO {
            return Err(crate::error::BotError::InvalidBankroll(
                "bankroll must be positive".to_string(),
            ));
        }
        if start_bank < self.config.min_bankroll {
            return Err(crate::error::BotError::InvalidBankroll(format!(
                "bankroll below minimum of {}",
                self.config.min_bankroll
            )));
        }
        let sub = Subscriber::new(chat_id, start_bank, &self.config);
        self.subscribers.write().insert(chat_id, sub.clone());
        tracing::info!(chat_id, bank = %start_bank, "subscriber registered");
        Ok(sub)
    }

    pub fn deactivate(&self, chat_id: i64) -> bool {
        let mut subs = self.subscribers.write();
        match subs.get_mut(&chat_id) {
            Some(sub) => {
                sub.active = false;
                true
            }
            None => false,
        }
    }

    pub fn subscriber(&self, chat_id: i64) -> Option<Subscriber> {
        self.subscribers.read().get(&chat_id).cloned()
    }

    pub fn is_active(&self, chat_id: i64) -> bool {
        self.subscribers
            .read()
            .get(&chat_id)
            .map(|s| s.active)
            .unwrap_or(false)
    }

    pub fn active_ids(&self) -> Vec<i64> {
        self.subscribers
            .read()
            .values()
            .filter(|s| s.active)
            .map(|s| s.chat_id)
            .collect()
    }

    /// Applies a decision to one subscriber, producing a sized stake plan
    /// and recording it as the pending signal.
    ///
    /// Returns `None` (a no-op) when any precondition fails: inactive
    /// subscriber, chaotic decision, confidence below threshold, an
    /// outstanding pending signal, blackout window, hourly pause,
    /// cold-table standby, or an exhausted hourly quota.
    ///
    /// `history_seq` is the history sequence the decision was computed
    /// from; it is stamped onto the pending signal so settlement only
    /// accepts a strictly newer spin.
    pub fn propose_signal(
        &self,
        chat_id: i64,
        decision: &Decision,
        history_seq: u64,
        session: &SessionController,
        now: DateTime<FixedOffset>,
    ) -> Option<StakePlan> {
        if decision.chaotic || decision.confidence < self.confidence_threshold {
            return None;
        }
        if session.in_blackout(now) || session.hourly_paused(now) {
            return None;
        }
        if session.in_standby(chat_id, now) {
            return None;
        }

        let mut subs = self.subscribers.write();
        let sub = subs.get_mut(&chat_id)?;
        if !sub.active || sub.pending.is_some() {
            return None;
        }

        // Quota is consumed last so a rejected proposal never burns a slot.
        if !session.try_acquire_signal(chat_id, now) {
            return None;
        }

        let escalation_authorized = decision.confidence >= self.config.escalation_confidence;
        let base = (sub.bank * self.config.base_stake_pct).round_dp(2);
        let column_stake = if escalation_authorized && sub.escalation_step > 0 {
            scaled_stake(base, self.config.multiplier, sub.escalation_step).round_dp(2)
        } else {
            base
        };
        let zero_stake = (sub.bank * self.config.zero_stake_pct).round_dp(2);

        let plan = StakePlan {
            play: decision.play,
            column_stake,
            zero_stake,
            escalation_step: sub.escalation_step,
            escalation_authorized,
            confidence: decision.confidence,
            mode: decision.mode,
            streak: decision.streak,
        };

        sub.pending = Some(PendingSignal {
            play: plan.play,
            column_stake: plan.column_stake,
            zero_stake: plan.zero_stake,
            escalation_authorized,
            history_seq,
        });
        sub.signals_today += 1;

        tracing::info!(
            chat_id,
            columns = ?plan.play.map(|c| c.number()),
            stake = %plan.column_stake,
            step = plan.escalation_step,
            confidence = plan.confidence,
            "signal proposed"
        );
        Some(plan)
    }

    /// Settles a subscriber's pending signal against the next real spin.
    /// Returns `None` when nothing is pending, or when the spin's history
    /// sequence is not newer than the one the signal was proposed from
    /// (the pending stays put and waits for the next spin).
    pub fn settle(
        &self,
        chat_id: i64,
        spin: Spin,
        spin_seq: u64,
        session: &SessionController,
        now: DateTime<FixedOffset>,
    ) -> Option<Settlement> {
        let mut subs = self.subscribers.write();
        let sub = subs.get_mut(&chat_id)?;
        if sub.pending.as_ref()?.history_seq >= spin_seq {
            return None;
        }
        let pending = sub.pending.take()?;

        let (outcome, delta) = if spin.is_zero() {
            (SettlementOutcome::ZeroCovered, Decimal::ZERO)
        } else if spin.column().is_some_and(|c| pending.play.contains(&c)) {
            (
                SettlementOutcome::Win,
                pending.column_stake - pending.zero_stake,
            )
        } else {
            (
                SettlementOutcome::Loss,
                -(Decimal::TWO * pending.column_stake + pending.zero_stake),
            )
        };

        let mut standby = false;
        match outcome {
            SettlementOutcome::Win => {
                sub.bank += delta;
                sub.wins_today += 1;
                sub.escalation_step = 0;
                sub.reds_row = 0;
            }
            SettlementOutcome::Loss => {
                sub.bank += delta;
                sub.reds_today += 1;
                sub.reds_row += 1;
                sub.escalation_step = if pending.escalation_authorized {
                    (sub.escalation_step + 1).min(self.config.max_escalation_step)
                } else {
                    0
                };
                standby = session.maybe_engage_standby(chat_id, sub.reds_row, now);
            }
            SettlementOutcome::ZeroCovered => {
                sub.reds_row = 0;
            }
        }

        if delta != Decimal::ZERO {
            session.record_profit(now, delta);
        }

        let deactivated = if sub.bank >= sub.target {
            Some(DeactivationReason::DailyTargetReached)
        } else if sub.bank <= sub.stop {
            Some(DeactivationReason::StopLossReached)
        } else {
            None
        };
        if deactivated.is_some() {
            sub.active = false;
        }

        tracing::info!(
            chat_id,
            spin = %spin,
            outcome = %outcome,
            delta = %delta,
            bank = %sub.bank,
            "signal settled"
        );

        Some(Settlement {
            spin,
            outcome,
            delta,
            bank: sub.bank,
            wins_today: sub.wins_today,
            reds_today: sub.reds_today,
            deactivated,
            standby,
        })
    }

    /// Settles every outstanding pending signal against a freshly recorded
    /// spin. Called by the collector after the history append; `spin_seq`
    /// is the sequence the append produced.
    pub fn settle_all(
        &self,
        spin: Spin,
        spin_seq: u64,
        session: &SessionController,
        now: DateTime<FixedOffset>,
    ) -> Vec<(i64, Settlement)> {
        let ids: Vec<i64> = self
            .subscribers
            .read()
            .values()
            .filter(|s| s.pending.is_some())
            .map(|s| s.chat_id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.settle(id, spin, spin_seq, session, now).map(|s| (id, s)))
            .collect()
    }

    /// Resets daily counters and escalation steps when the local day key
    /// changes. Bankrolls and active flags are left untouched. Returns
    /// whether a rollover happened.
    pub fn maybe_daily_rollover(&self, date_key: &str) -> bool {
        let mut day = self.current_day.lock();
        if *day == date_key {
            return false;
        }
        let first = day.is_empty();
        *day = date_key.to_string();
        if first {
            return false;
        }

        let mut subs = self.subscribers.write();
        for sub in subs.values_mut() {
            sub.wins_today = 0;
            sub.reds_today = 0;
            sub.signals_today = 0;
            sub.escalation_step = 0;
            sub.reds_row = 0;
        }
        tracing::info!(day = date_key, "daily rollover applied");
        true
    }
}
