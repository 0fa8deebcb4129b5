//! Telegram notifications
//!
//! Outbound messages only. Every helper is fire-and-forget from the
//! caller's perspective: a delivery failure is logged and swallowed, it
//! never reaches back into core state.

use crate::bankroll::Subscriber;
use crate::error::{BotError, Result};
use crate::types::{DeactivationReason, Settlement, SettlementOutcome, StakePlan};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: i64,
    text: String,
    parse_mode: String,
}

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: Option<String>,
}

impl Notifier {
    pub fn new(bot_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: Some(bot_token),
        }
    }

    /// A notifier that drops everything. Used when Telegram is not
    /// configured.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: None,
        }
    }

    pub async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        let Some(token) = &self.bot_token else {
            return Ok(());
        };
        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: "Markdown".to_string(),
        };
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(BotError::Telegram(format!(
                "sendMessage returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Fire-and-forget send; failures are logged.
    async fn send_quiet(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.send(chat_id, text).await {
            tracing::warn!(chat_id, "failed to send notification: {}", e);
        }
    }

    pub async fn registered(&self, chat_id: i64, sub: &Subscriber) {
        let text = format!(
            "✅ *Bankroll registered: {:.2}*\n\
            🎯 Daily target: {:.2}\n\
            🛑 Stop loss: {:.2}\n\
            🔎 Continuous analysis started. Statistical alerts only, \
            no guarantee of profit.",
            sub.start_bank, sub.target, sub.stop
        );
        self.send_quiet(chat_id, &text).await;
    }

    pub async fn signal_proposed(&self, chat_id: i64, plan: &StakePlan) {
        let streak = match plan.streak {
            Some((col, len)) => format!("{}x on column {}", len, col),
            None => "none".to_string(),
        };
        let escalation = if plan.escalation_authorized && plan.escalation_step > 0 {
            format!(" (step {})", plan.escalation_step)
        } else {
            String::new()
        };
        let text = format!(
            "🚨 *SIGNAL*\n\
            🎯 Columns: *{} and {}*\n\
            🪙 {:.2} each{} | Zero: {:.2}\n\
            📈 Confidence: *{}%*\n\
            🧭 Mode: {} | Streak: {}",
            plan.play[0],
            plan.play[1],
            plan.column_stake,
            escalation,
            plan.zero_stake,
            (plan.confidence * 100.0).round() as u32,
            plan.mode,
            streak
        );
        self.send_quiet(chat_id, &text).await;
    }

    pub async fn settled(&self, chat_id: i64, settlement: &Settlement) {
        let headline = match settlement.outcome {
            SettlementOutcome::Win => format!("✅ *WIN* on {} → +{:.2}", settlement.spin, settlement.delta),
            SettlementOutcome::Loss => format!("❌ *RED* on {} → {:.2}", settlement.spin, settlement.delta),
            SettlementOutcome::ZeroCovered => format!("🟢 *ZERO COVERED* on {}", settlement.spin),
        };
        let text = format!(
            "{}\n\
            💰 Bank: {:.2}\n\
            📊 W/R: {} / {}",
            headline, settlement.bank, settlement.wins_today, settlement.reds_today
        );
        self.send_quiet(chat_id, &text).await;
    }

    pub async fn deactivated(&self, chat_id: i64, reason: DeactivationReason, bank: rust_decimal::Decimal) {
        let text = match reason {
            DeactivationReason::DailyTargetReached => format!(
                "🏁 *Daily target reached!*\n💰 Final bank: {:.2}\n\
                No more signals today. Send /start to register again.",
                bank
            ),
            DeactivationReason::StopLossReached => format!(
                "🛑 *Stop loss reached.*\n💰 Final bank: {:.2}\n\
                No more signals today. Send /start to register again.",
                bank
            ),
        };
        self.send_quiet(chat_id, &text).await;
    }

    pub async fn standby(&self, chat_id: i64, secs: u64) {
        let text = format!(
            "❄️ *Unstable table.* Standing by for {} seconds, no new signals.",
            secs
        );
        self.send_quiet(chat_id, &text).await;
    }

    pub async fn error(&self, chat_id: i64, context: &str, detail: &str) {
        let text = format!("⚠️ *{}*\n{}", context, detail);
        self.send_quiet(chat_id, &text).await;
    }
}
