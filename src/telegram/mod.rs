//! Telegram bot for subscriber onboarding and commands
//!
//! Long-polls getUpdates. `/start` opens the registration flow: the next
//! numeric message from that chat becomes the starting bankroll. Invalid
//! input gets one retry prompt and mutates nothing.

use crate::bankroll::SubscriberBook;
use crate::error::Result;
use crate::notify::Notifier;
use crate::session::SessionController;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    result: Vec<TelegramUpdate>,
}

pub struct TelegramBot {
    http: reqwest::Client,
    bot_token: String,
    book: Arc<SubscriberBook>,
    session: Arc<SessionController>,
    notifier: Notifier,
    /// Chats that sent /start and owe us a bankroll amount.
    awaiting_bank: Mutex<HashSet<i64>>,
    last_update_id: Mutex<i64>,
    /// Signals `main` to spawn a decision task for a fresh registration.
    registration_tx: mpsc::Sender<i64>,
}

impl TelegramBot {
    pub fn new(
        bot_token: String,
        book: Arc<SubscriberBook>,
        session: Arc<SessionController>,
        notifier: Notifier,
        registration_tx: mpsc::Sender<i64>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            book,
            session,
            notifier,
            awaiting_bank: Mutex::new(HashSet::new()),
            last_update_id: Mutex::new(0),
            registration_tx,
        }
    }

    /// Long-poll loop. Runs until the process exits.
    pub async fn start_polling(self: Arc<Self>) {
        tracing::info!("Telegram command listener started");

        loop {
            match self.poll_updates().await {
                Ok(updates) => {
                    for update in updates {
                        *self.last_update_id.lock() = update.update_id + 1;
                        if let Some(msg) = update.message {
                            if let Some(text) = msg.text {
                                self.handle_message(msg.chat.id, &text).await;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("failed to poll Telegram updates: {}", e);
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }

            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }
    }

    async fn poll_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = *self.last_update_id.lock();
        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates?offset={}&timeout=30",
            self.bot_token, offset
        );
        let response: GetUpdatesResponse = self.http.get(&url).send().await?.json().await?;
        Ok(response.result)
    }

    async fn handle_message(&self, chat_id: i64, text: &str) {
        let text = text.trim();

        if let Some(rest) = text.strip_prefix('/') {
            let cmd = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .split('@')
                .next()
                .unwrap_or("");
            tracing::info!(chat_id, "received command: /{}", cmd);
            match cmd.to_lowercase().as_str() {
                "start" => self.handle_start(chat_id).await,
                "status" => self.handle_status(chat_id).await,
                "stop" => self.handle_stop(chat_id).await,
                other => {
                    self.notifier
                        .error(
                            chat_id,
                            "Unknown command",
                            &format!("/{}. Available: /start /status /stop", other),
                        )
                        .await;
                }
            }
            return;
        }

        // Non-command text only matters while registration is open.
        if self.awaiting_bank.lock().contains(&chat_id) {
            self.handle_bankroll_input(chat_id, text).await;
        }
    }

    async fn handle_start(&self, chat_id: i64) {
        self.awaiting_bank.lock().insert(chat_id);
        let _ = self
            .notifier
            .send(chat_id, "🤖 What is your starting bankroll? (e.g. 50)")
            .await;
    }

    async fn handle_bankroll_input(&self, chat_id: i64, text: &str) {
        // Accept both decimal separators
        let normalized = text.replace(',', ".");
        let amount = match Decimal::from_str(normalized.trim()) {
            Ok(v) => v,
            Err(_) => {
                self.notifier
                    .error(chat_id, "Invalid amount", "Digits only, e.g. 50")
                    .await;
                return;
            }
        };

        match self.book.register(chat_id, amount) {
            Ok(sub) => {
                self.awaiting_bank.lock().remove(&chat_id);
                self.notifier.registered(chat_id, &sub).await;
                if self.registration_tx.send(chat_id).await.is_err() {
                    tracing::error!(chat_id, "registration channel closed");
                }
            }
            Err(e) => {
                // State untouched; the chat stays in the registration flow.
                self.notifier
                    .error(chat_id, "Invalid bankroll", &e.to_string())
                    .await;
            }
        }
    }

    async fn handle_status(&self, chat_id: i64) {
        let Some(sub) = self.book.subscriber(chat_id) else {
            let _ = self
                .notifier
                .send(chat_id, "📭 Not registered. Send /start to begin.")
                .await;
            return;
        };

        let now = self.session.clock().now();
        let status = if sub.active { "▶️ ACTIVE" } else { "⏹ STOPPED" };
        let text = format!(
            "💰 *Status*\n\
            {}\n\
            Bank: {:.2} (start {:.2})\n\
            Target: {:.2} | Stop: {:.2}\n\
            W/R today: {} / {}\n\
            Signals this hour: {}/{}\n\
            Table: {}",
            status,
            sub.bank,
            sub.start_bank,
            sub.target,
            sub.stop,
            sub.wins_today,
            sub.reds_today,
            self.session.signals_this_hour(chat_id, now),
            self.session.max_signals_per_hour(),
            self.session.clock().status_label(now),
        );
        let _ = self.notifier.send(chat_id, &text).await;
    }

    async fn handle_stop(&self, chat_id: i64) {
        if self.book.deactivate(chat_id) {
            let _ = self
                .notifier
                .send(chat_id, "⏹ Signals stopped. Send /start to register again.")
                .await;
        } else {
            let _ = self
                .notifier
                .send(chat_id, "📭 Not registered. Send /start to begin.")
                .await;
        }
    }
}
