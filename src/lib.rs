//! Roulette Column-Bias Signal Bot
//!
//! Polls a live auto-roulette result feed, derives a column-bias signal
//! from a rolling window of spins, and pushes sized stake alerts to
//! Telegram subscribers with simulated bankroll tracking.
//!
//! ## Architecture
//!
//! ```text
//! Feed (HTTP poll) → SpinHistory → AdaptiveStrategy → SubscriberBook → Notifier
//!                                        ↑                  ↑
//!                              SessionController (quota, blackout, hourly brake)
//! ```
//!
//! The signals are heuristic frequency-bias alerts over a finite window;
//! nothing here claims a statistical edge and no real money moves.

pub mod bankroll;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod notify;
pub mod session;
pub mod strategy;
pub mod telegram;
pub mod types;
