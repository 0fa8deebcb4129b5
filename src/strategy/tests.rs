//! Unit tests for the adaptive column strategy

use super::*;
use crate::config::StrategyConfig;
use crate::types::{Column, Spin, StrategyMode};

fn spins(numbers: &[u8]) -> Vec<Spin> {
    numbers.iter().map(|&n| Spin::new(n).unwrap()).collect()
}

fn make_strategy() -> AdaptiveStrategy {
    AdaptiveStrategy::new(StrategyConfig::default())
}

#[test]
fn test_counts_sum_and_keys() {
    // 20 spins, two zeros among them
    let window = spins(&[1, 2, 3, 0, 4, 5, 6, 7, 8, 9, 0, 10, 11, 12, 13, 14, 15, 16, 17, 18]);
    let counts = column_counts(&window);

    let non_zero = window.iter().filter(|s| !s.is_zero()).count();
    assert_eq!(counts.total(), non_zero);

    // Every column key is addressable even at count zero
    let empty = column_counts(&[]);
    for col in Column::ALL {
        assert_eq!(empty.get(col), 0);
    }
}

#[test]
fn test_stats_idempotent() {
    let window = spins(&[5, 8, 11, 0, 2, 2, 9]);
    let a = WindowStats::compute(&window);
    let b = WindowStats::compute(&window);
    assert_eq!(a, b);
}

#[test]
fn test_chi_square_empty_window() {
    assert_eq!(chi_square_uniform(&column_counts(&[])), 0.0);
    // All zeros counts as empty too
    assert_eq!(chi_square_uniform(&column_counts(&spins(&[0, 0]))), 0.0);
}

#[test]
fn test_streak_skips_zeros_and_stops_at_change() {
    // Most recent first: three column-1 spins, then a column-2 spin;
    // the zero later on is irrelevant.
    let history = spins(&[1, 1, 1, 2, 0, 1, 1]);
    assert_eq!(column_streak(&history), Some((Column::First, 3)));

    // A zero inside the run is skipped, not a break
    let history = spins(&[1, 0, 1, 2]);
    assert_eq!(column_streak(&history), Some((Column::First, 2)));

    // No non-zero spin at all
    assert_eq!(column_streak(&spins(&[0, 0])), None);
    assert_eq!(column_streak(&[]), None);
}

#[test]
fn test_tie_break_lowest_column() {
    // Equal counts everywhere: both selectors pick column 1
    let counts = column_counts(&spins(&[1, 2, 3]));
    assert_eq!(counts.weakest(), Column::First);
    assert_eq!(counts.hottest(), Column::First);

    // Columns 2 and 3 tied for weakest: column 2 wins
    let counts = column_counts(&spins(&[1, 1, 2, 3]));
    assert_eq!(counts.weakest(), Column::Second);
}

#[test]
fn test_insufficient_history_is_chaotic() {
    let strategy = make_strategy();
    // window_size 20 needs 22 spins; give it 21
    let history = spins(&[1; 21]);
    let decision = strategy.decide(&history);

    assert!(decision.chaotic);
    assert_eq!(decision.confidence, 0.0);
    assert_eq!(decision.mode, StrategyMode::ExcludeWeak);
    assert_eq!(decision.exclude, Column::Third);
    assert_eq!(decision.play, [Column::First, Column::Second]);
}

#[test]
fn test_uniform_window_without_momentum_is_chaotic() {
    let strategy = make_strategy();
    // Alternating 1,2,3: near-uniform counts, streak of 1
    let mut numbers = Vec::new();
    for i in 0..22u8 {
        numbers.push(1 + (i % 3));
    }
    let decision = strategy.decide(&spins(&numbers));

    assert!(decision.chaotic);
    assert_eq!(decision.streak.map(|(_, len)| len), Some(1));
    assert_eq!(decision.mode, StrategyMode::ExcludeWeak);
}

#[test]
fn test_hot_streak_flips_to_reversal() {
    let strategy = make_strategy();
    // 15 straight third-column spins, then some noise: streak 15 >= 6
    let mut numbers = vec![3, 6, 9, 12, 15, 18, 21, 24, 27, 30, 33, 36, 3, 6, 9];
    numbers.extend_from_slice(&[1, 2, 1, 2, 1, 1, 2]);
    let decision = strategy.decide(&spins(&numbers));

    assert_eq!(decision.mode, StrategyMode::ExcludeHot);
    assert_eq!(decision.exclude, Column::Third);
    assert_eq!(decision.play, [Column::First, Column::Second]);
    assert!(!decision.chaotic);
    assert_eq!(decision.streak, Some((Column::Third, 15)));

    // Confidence: 1 - 15/20 plus the capped streak bonus of 0.10
    assert!((decision.confidence - 0.35).abs() < 1e-9);
}

#[test]
fn test_momentum_mode_confidence() {
    let strategy = make_strategy();
    // Window counts: col1=10, col2=6, col3=4; leading streak of 1
    let mut numbers = vec![1, 2];
    numbers.extend(std::iter::repeat(1).take(9));
    numbers.extend(std::iter::repeat(2).take(5));
    numbers.extend(std::iter::repeat(3).take(4));
    // Pad history beyond the window edge
    numbers.extend_from_slice(&[3, 3]);
    let decision = strategy.decide(&spins(&numbers));

    assert_eq!(decision.mode, StrategyMode::ExcludeWeak);
    assert_eq!(decision.exclude, Column::Third);
    assert_eq!(decision.play, [Column::First, Column::Second]);
    assert!(!decision.chaotic);
    // 1 - 4/20, no streak bonus below length 3
    assert!((decision.confidence - 0.80).abs() < 1e-9);
}

#[test]
fn test_streak_bonus_below_three_is_zero() {
    let strategy = make_strategy();
    // Same skew as above but with a leading streak of 2
    let mut numbers = vec![1, 1];
    numbers.extend(std::iter::repeat(2).take(6));
    numbers.extend(std::iter::repeat(1).take(8));
    numbers.extend(std::iter::repeat(3).take(4));
    numbers.extend_from_slice(&[2, 2]);
    let decision = strategy.decide(&spins(&numbers));

    assert_eq!(decision.streak, Some((Column::First, 2)));
    // counts: col1=10, col2=6, col3=4 -> 1 - 4/20 with zero bonus
    assert!((decision.confidence - 0.80).abs() < 1e-9);
}

#[test]
fn test_confidence_clamped_to_unit_interval() {
    let strategy = make_strategy();
    // Excluded column absent from the window entirely: base term is 1.0,
    // any bonus must not push past 1.0
    let mut numbers = Vec::new();
    numbers.extend(std::iter::repeat(1).take(4));
    numbers.extend(std::iter::repeat(2).take(16));
    numbers.extend_from_slice(&[2, 2]);
    let decision = strategy.decide(&spins(&numbers));

    assert!(decision.confidence <= 1.0);
    assert!(decision.confidence >= 0.0);
}
