//! Core data types shared across the bot

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw result from the roulette feed (0..=36).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spin(u8);

impl Spin {
    pub const MAX: u8 = 36;

    /// Returns `None` for values outside the wheel.
    pub fn new(n: u8) -> Option<Self> {
        (n <= Self::MAX).then_some(Self(n))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The column this spin falls into; zero belongs to no column.
    pub fn column(&self) -> Option<Column> {
        Column::of(self.0)
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the three roulette columns.
///
/// Single source of truth for the number-to-column mapping: `n % 3`,
/// with remainder 0 folded into the third column. Ordering is by column
/// number, which is also the tie-break order in the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    First,
    Second,
    Third,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::First, Column::Second, Column::Third];

    /// Maps a raw number to its column. Zero maps to no column.
    pub fn of(n: u8) -> Option<Self> {
        if n == 0 {
            return None;
        }
        Some(match n % 3 {
            1 => Column::First,
            2 => Column::Second,
            _ => Column::Third,
        })
    }

    /// Column number as shown to subscribers (1, 2 or 3).
    pub fn number(&self) -> u8 {
        match self {
            Column::First => 1,
            Column::Second => 2,
            Column::Third => 3,
        }
    }

    /// The two columns other than `self`.
    pub fn others(&self) -> [Column; 2] {
        match self {
            Column::First => [Column::Second, Column::Third],
            Column::Second => [Column::First, Column::Third],
            Column::Third => [Column::First, Column::Second],
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Which of the two opposing heuristics produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Momentum bet: exclude the laggard column.
    ExcludeWeak,
    /// Reversal bet: exclude the overheated column.
    ExcludeHot,
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyMode::ExcludeWeak => write!(f, "exclude_weak"),
            StrategyMode::ExcludeHot => write!(f, "exclude_hot"),
        }
    }
}

/// Output of the adaptive decision engine for one analysis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mode: StrategyMode,
    pub exclude: Column,
    pub play: [Column; 2],
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    /// No detectable bias and no momentum; do not signal.
    pub chaotic: bool,
    /// Column and length of the current same-column run, if any.
    pub streak: Option<(Column, usize)>,
}

impl Decision {
    pub fn streak_len(&self) -> usize {
        self.streak.map(|(_, len)| len).unwrap_or(0)
    }
}

/// A sized bet recommendation issued to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct StakePlan {
    pub play: [Column; 2],
    /// Stake per played column.
    pub column_stake: Decimal,
    /// Fixed cover stake on zero.
    pub zero_stake: Decimal,
    /// Escalation step the column stake was scaled by.
    pub escalation_step: u32,
    /// Whether a loss on this signal may escalate the next stake.
    pub escalation_authorized: bool,
    pub confidence: f64,
    pub mode: StrategyMode,
    pub streak: Option<(Column, usize)>,
}

/// How a pending signal resolved against the next spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Win,
    Loss,
    /// The spin was zero: the zero cover applies, bankroll untouched.
    ZeroCovered,
}

impl fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementOutcome::Win => write!(f, "WIN"),
            SettlementOutcome::Loss => write!(f, "LOSS"),
            SettlementOutcome::ZeroCovered => write!(f, "ZERO COVERED"),
        }
    }
}

/// Why a subscriber was deactivated for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    DailyTargetReached,
    StopLossReached,
}

/// Structured result of settling a pending signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub spin: Spin,
    pub outcome: SettlementOutcome,
    /// Signed bankroll change (zero for a covered spin).
    pub delta: Decimal,
    /// Bankroll after settlement.
    pub bank: Decimal,
    pub wins_today: u32,
    pub reds_today: u32,
    pub deactivated: Option<DeactivationReason>,
    /// This loss tipped the subscriber into the cold-table standby.
    pub standby: bool,
}
