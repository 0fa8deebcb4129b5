//! Adaptive column strategy
//!
//! Two opposing heuristics reconciled by one streak trigger:
//! - `exclude_weak`: momentum bet, exclude the least frequent column
//! - `exclude_hot`: reversal bet, exclude the dominant column once its
//!   run length reaches the trigger
//!
//! A chaotic gate (near-uniform distribution and no momentum) suppresses
//! signaling independently of confidence.

#[cfg(test)]
mod tests;

use crate::config::StrategyConfig;
use crate::types::{Column, Decision, Spin, StrategyMode};

/// Per-column tallies over an analysis window. All three columns are always
/// present, zero-count included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnCounts([usize; 3]);

impl ColumnCounts {
    pub fn get(&self, col: Column) -> usize {
        self.0[col.number() as usize - 1]
    }

    /// Number of non-zero spins tallied.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Least frequent column; ties go to the lowest column number.
    pub fn weakest(&self) -> Column {
        let mut best = Column::First;
        for col in Column::ALL {
            if self.get(col) < self.get(best) {
                best = col;
            }
        }
        best
    }

    /// Most frequent column; ties go to the lowest column number.
    pub fn hottest(&self) -> Column {
        let mut best = Column::First;
        for col in Column::ALL {
            if self.get(col) > self.get(best) {
                best = col;
            }
        }
        best
    }
}

/// Tallies the column of every non-zero spin in the window.
pub fn column_counts(window: &[Spin]) -> ColumnCounts {
    let mut counts = ColumnCounts::default();
    for spin in window {
        if let Some(col) = spin.column() {
            counts.0[col.number() as usize - 1] += 1;
        }
    }
    counts
}

/// Chi-square statistic against the uniform expectation of `total / 3`
/// per column. Zero when the window holds no non-zero spins.
pub fn chi_square_uniform(counts: &ColumnCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    let expected = total as f64 / 3.0;
    Column::ALL
        .iter()
        .map(|&col| {
            let diff = counts.get(col) as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// Current same-column run, scanning most-recent-first. Zeros are skipped;
/// the scan stops at the first column change. `None` when no non-zero spin
/// exists.
pub fn column_streak(spins: &[Spin]) -> Option<(Column, usize)> {
    let mut run: Option<(Column, usize)> = None;
    for spin in spins {
        let Some(col) = spin.column() else {
            continue;
        };
        match run {
            None => run = Some((col, 1)),
            Some((head, len)) if head == col => run = Some((head, len + 1)),
            Some(_) => break,
        }
    }
    run
}

/// Derived statistics for one analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub counts: ColumnCounts,
    pub chi_square: f64,
    pub streak: Option<(Column, usize)>,
}

impl WindowStats {
    pub fn compute(window: &[Spin]) -> Self {
        let counts = column_counts(window);
        Self {
            counts,
            chi_square: chi_square_uniform(&counts),
            streak: column_streak(window),
        }
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// The signal decision engine.
pub struct AdaptiveStrategy {
    config: StrategyConfig,
}

impl AdaptiveStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Spins required before a real decision is attempted.
    pub fn min_history(&self) -> usize {
        self.config.window_size + 2
    }

    /// Decide a play for the given history (most recent first).
    ///
    /// With insufficient history this returns a chaotic, zero-confidence
    /// decision with the fixed default play; callers must not signal on it.
    pub fn decide(&self, history: &[Spin]) -> Decision {
        if history.len() < self.min_history() {
            return Decision {
                mode: StrategyMode::ExcludeWeak,
                exclude: Column::Third,
                play: [Column::First, Column::Second],
                confidence: 0.0,
                chaotic: true,
                streak: None,
            };
        }

        let window = &history[..self.config.window_size];
        let counts = column_counts(window);
        let total = counts.total();

        let exclude_weak = counts.weakest();
        let exclude_hot = counts.hottest();

        // The run is measured over the full history, not just the window,
        // so a streak that began before the window edge still counts.
        let streak = column_streak(history);
        let streak_len = streak.map(|(_, len)| len).unwrap_or(0);

        let mode = if streak_len >= self.config.streak_trigger {
            StrategyMode::ExcludeHot
        } else {
            StrategyMode::ExcludeWeak
        };
        let exclude = match mode {
            StrategyMode::ExcludeHot => exclude_hot,
            StrategyMode::ExcludeWeak => exclude_weak,
        };

        let chi2 = chi_square_uniform(&counts);
        let chaotic = chi2 < self.config.chaotic_threshold && streak_len <= 2;

        let base_conf = if total > 0 {
            1.0 - counts.get(exclude) as f64 / total as f64
        } else {
            0.0
        };
        let streak_bonus = (streak_len.saturating_sub(2) as f64 * 0.02)
            .min(self.config.streak_bonus_cap);
        let confidence = clamp01(base_conf + streak_bonus);

        Decision {
            mode,
            exclude,
            play: exclude.others(),
            confidence,
            chaotic,
            streak,
        }
    }
}
