//! Error types for the bot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Invalid bankroll: {0}")]
    InvalidBankroll(String),

    #[error("Unknown subscriber: {0}")]
    UnknownSubscriber(i64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
