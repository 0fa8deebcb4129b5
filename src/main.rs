//! Roulette column-bias signal bot
//!
//! Collector task polls the result feed; one decision task per active
//! subscriber turns window statistics into sized stake alerts.

use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use roulette_signal_bot::{
    bankroll::SubscriberBook,
    config::{Config, FeedConfig},
    feed::{CasinoFeed, SpinSource},
    history::SpinHistory,
    notify::Notifier,
    session::SessionController,
    strategy::{AdaptiveStrategy, WindowStats},
    telegram::TelegramBot,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "roulette-signal-bot")]
#[command(about = "Column-bias signal bot for live auto-roulette feeds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signal bot
    Run,
    /// Show recent spins and the current window statistics
    Spins {
        /// Number of spins to fetch
        #[arg(short, long, default_value = "24")]
        limit: usize,
    },
    /// Send a test message to a chat
    TestNotify {
        /// Telegram chat id
        chat_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run => run_bot(config).await,
        Commands::Spins { limit } => show_spins(config, limit).await,
        Commands::TestNotify { chat_id } => test_notify(config, chat_id).await,
    }
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    tracing::info!("starting roulette signal bot");

    let notifier = match &config.telegram {
        Some(tg) => Notifier::new(tg.bot_token.clone()),
        None => {
            tracing::warn!("Telegram not configured, running headless");
            Notifier::disabled()
        }
    };

    let session = Arc::new(SessionController::new(config.session.clone()));
    let book = Arc::new(SubscriberBook::new(
        config.stake.clone(),
        config.strategy.confidence_threshold,
    ));
    let history = Arc::new(RwLock::new(SpinHistory::new(config.strategy.history_capacity)));
    let strategy = Arc::new(AdaptiveStrategy::new(config.strategy.clone()));

    let (reg_tx, mut reg_rx) = mpsc::channel::<i64>(32);

    if let Some(tg) = &config.telegram {
        let bot = Arc::new(TelegramBot::new(
            tg.bot_token.clone(),
            book.clone(),
            session.clone(),
            notifier.clone(),
            reg_tx,
        ));
        tokio::spawn(bot.start_polling());
    } else {
        drop(reg_tx);
    }

    // Outcome collector
    let collector = {
        let feed = CasinoFeed::new(&config.feed)?;
        let history = history.clone();
        let book = book.clone();
        let session = session.clone();
        let notifier = notifier.clone();
        let notify_settlements = config
            .telegram
            .as_ref()
            .map(|tg| tg.notify_settlements)
            .unwrap_or(false);
        let notify_errors = config
            .telegram
            .as_ref()
            .map(|tg| tg.notify_errors)
            .unwrap_or(false);
        let feed_config = config.feed.clone();
        tokio::spawn(async move {
            collector_loop(
                feed,
                feed_config,
                history,
                book,
                session,
                notifier,
                notify_settlements,
                notify_errors,
            )
            .await;
        })
    };

    // Headless: no registrations can arrive, the collector is the whole
    // bot, so run until it stops.
    if config.telegram.is_none() {
        collector.await?;
        return Ok(());
    }

    // One decision task per registration; the task exits on its own once
    // the subscriber goes inactive.
    while let Some(chat_id) = reg_rx.recv().await {
        let history = history.clone();
        let book = book.clone();
        let session = session.clone();
        let strategy = strategy.clone();
        let notifier = notifier.clone();
        let notify_signals = config
            .telegram
            .as_ref()
            .map(|tg| tg.notify_signals)
            .unwrap_or(false);
        let interval_secs = config.strategy.decision_interval_secs;
        tokio::spawn(async move {
            decision_loop(
                chat_id,
                history,
                book,
                session,
                strategy,
                notifier,
                notify_signals,
                interval_secs,
            )
            .await;
        });
    }

    tracing::info!("registration channel closed, shutting down");
    Ok(())
}

/// Consecutive failed polls before subscribers hear about a feed outage.
const FEED_OUTAGE_ALERT_AFTER: u32 = 10;

/// Polls the feed and drives settlement. The history append always happens
/// before settlement so subsequent decisions see updated statistics, and a
/// pending signal only ever settles against a spin strictly newer than the
/// one that produced it.
#[allow(clippy::too_many_arguments)]
async fn collector_loop(
    feed: CasinoFeed,
    config: FeedConfig,
    history: Arc<RwLock<SpinHistory>>,
    book: Arc<SubscriberBook>,
    session: Arc<SessionController>,
    notifier: Notifier,
    notify_settlements: bool,
    notify_errors: bool,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    let mut consecutive_failures: u32 = 0;

    loop {
        interval.tick().await;

        // Unavailable feed means skip the cycle, nothing more. A long run
        // of failures gets one alert to active subscribers and a backoff.
        let Some(spin) = feed.fetch_latest().await else {
            consecutive_failures += 1;
            if consecutive_failures == FEED_OUTAGE_ALERT_AFTER {
                tracing::error!(
                    failures = consecutive_failures,
                    "feed unavailable for an extended period"
                );
                if notify_errors {
                    for chat_id in book.active_ids() {
                        notifier
                            .error(
                                chat_id,
                                "Feed unavailable",
                                "The result feed is not responding. \
                                Signals resume automatically once it recovers.",
                            )
                            .await;
                    }
                }
            }
            tokio::time::sleep(Duration::from_secs(config.fault_backoff_secs)).await;
            continue;
        };
        consecutive_failures = 0;

        let spin_seq = {
            let mut guard = history.write();
            if !guard.record(spin) {
                // Same spin as last poll: no new data.
                continue;
            }
            guard.seq()
        };
        tracing::debug!(%spin, spin_seq, "new spin recorded");

        let now = session.clock().now();
        let settlements = book.settle_all(spin, spin_seq, &session, now);
        for (chat_id, settlement) in settlements {
            if notify_settlements {
                notifier.settled(chat_id, &settlement).await;
            }
            if settlement.standby {
                notifier.standby(chat_id, session.standby_secs()).await;
            }
            if let Some(reason) = settlement.deactivated {
                notifier.deactivated(chat_id, reason, settlement.bank).await;
            }
        }

        book.maybe_daily_rollover(&session.clock().date_key(now));
    }
}

/// Per-subscriber decision task. Deactivation is cooperative: the loop
/// checks the active flag at the top of each iteration and exits.
#[allow(clippy::too_many_arguments)]
async fn decision_loop(
    chat_id: i64,
    history: Arc<RwLock<SpinHistory>>,
    book: Arc<SubscriberBook>,
    session: Arc<SessionController>,
    strategy: Arc<AdaptiveStrategy>,
    notifier: Notifier,
    notify_signals: bool,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    tracing::info!(chat_id, "decision task started");

    loop {
        interval.tick().await;

        if !book.is_active(chat_id) {
            break;
        }

        let (snapshot, history_seq) = {
            let h = history.read();
            (h.snapshot(), h.seq())
        };
        let decision = strategy.decide(&snapshot);
        if decision.chaotic {
            continue;
        }

        let now = session.clock().now();
        if let Some(plan) = book.propose_signal(chat_id, &decision, history_seq, &session, now) {
            if notify_signals {
                notifier.signal_proposed(chat_id, &plan).await;
            }
        }
    }

    tracing::info!(chat_id, "decision task exited");
}

async fn show_spins(config: Config, limit: usize) -> anyhow::Result<()> {
    let feed = CasinoFeed::new(&config.feed)?;
    let spins = feed.fetch_recent(limit).await;

    if spins.is_empty() {
        println!("Feed unavailable or returned no spins");
        return Ok(());
    }

    println!("\n🎡 Last {} spins (newest first):\n", spins.len());
    let numbers: Vec<String> = spins.iter().map(|s| s.to_string()).collect();
    println!("  {}", numbers.join(" "));

    let window = &spins[..spins.len().min(config.strategy.window_size)];
    let stats = WindowStats::compute(window);
    println!("\nWindow of {} spins:", window.len());
    for col in roulette_signal_bot::types::Column::ALL {
        println!("  Column {}: {}", col, stats.counts.get(col));
    }
    println!("  Chi-square vs uniform: {:.3}", stats.chi_square);
    match stats.streak {
        Some((col, len)) => println!("  Streak: {}x on column {}", len, col),
        None => println!("  Streak: none"),
    }

    let strategy = AdaptiveStrategy::new(config.strategy.clone());
    let decision = strategy.decide(&spins);
    println!(
        "\nDecision: mode={} exclude={} play={} and {} confidence={:.0}% chaotic={}",
        decision.mode,
        decision.exclude,
        decision.play[0],
        decision.play[1],
        decision.confidence * 100.0,
        decision.chaotic
    );

    Ok(())
}

async fn test_notify(config: Config, chat_id: i64) -> anyhow::Result<()> {
    let tg = config
        .telegram
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Telegram not configured in config.toml"))?;

    let notifier = Notifier::new(tg.bot_token.clone());
    notifier
        .send(
            chat_id,
            "🧪 *Test notification*\n\nIf you see this, Telegram integration is working!",
        )
        .await?;

    println!("✅ Test notification sent!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_headless_run_keeps_collecting() {
        let mut config = Config::load("/nonexistent/config.toml").unwrap();
        config.telegram = None;
        config.feed.poll_interval_secs = 1;
        config.feed.fault_backoff_secs = 0;
        config.feed.timeout_secs = 1;

        // Without Telegram the bot must keep running on the collector
        // alone instead of returning as soon as the (empty) registration
        // channel closes.
        let outcome = tokio::time::timeout(Duration::from_millis(300), run_bot(config)).await;
        assert!(outcome.is_err(), "headless run returned early");
    }
}
