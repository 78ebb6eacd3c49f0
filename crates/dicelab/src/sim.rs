// ABOUTME: Monte Carlo statistics for dice formulas.
// ABOUTME: Builds outcome histograms, percentiles, and success distributions.

use crate::ast::{Formula, Reduction, Sign, Term};
use crate::error::Result;
use crate::parser;
use crate::roller::{reduce, FastRng, Rng};
use std::collections::BTreeMap;

/// Iteration count used when the caller has no preference.
pub const DEFAULT_ITERATIONS: usize = 100_000;

/// Nearest-rank percentiles of the simulated outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Percentiles {
    pub p25: i64,
    pub p50: i64,
    pub p75: i64,
    pub p90: i64,
    pub p95: i64,
    pub p99: i64,
}

/// Success statistics, present only for threshold formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdStats {
    pub average_successes: f64,
    /// Fraction of iterations whose outcome was greater than zero.
    pub probability_of_at_least_one: f64,
    /// Probability of each success count across the full possible range,
    /// zero-filled where an outcome never occurred.
    pub success_probabilities: BTreeMap<i64, f64>,
}

/// Empirical distribution of a formula over many simulated evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramResult {
    pub min: i64,
    pub max: i64,
    /// Outcome frequencies, ascending by outcome.
    pub frequencies: BTreeMap<i64, u64>,
    pub total_rolls: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub is_threshold_roll: bool,
    pub threshold_stats: Option<ThresholdStats>,
}

/// Simulate a formula and build its outcome distribution.
///
/// Parses and validates once, then re-evaluates the formula `iterations`
/// times on a lightweight path that materializes no per-die records.
/// Threshold formulas (any success-counting term) report a success-count
/// distribution instead of percentile statistics.
///
/// # Examples
///
/// ```
/// let stats = dicelab::compute_distribution("2d6", 10_000).unwrap();
/// assert!(stats.min >= 2 && stats.max <= 12);
/// assert!((stats.mean - 7.0).abs() < 0.5);
/// ```
pub fn compute_distribution(formula: &str, iterations: usize) -> Result<HistogramResult> {
    compute_distribution_with_rng(formula, iterations, &mut FastRng::new())
}

/// Simulate with a seeded die source for reproducible distributions.
pub fn compute_distribution_seeded(
    formula: &str,
    iterations: usize,
    seed: u64,
) -> Result<HistogramResult> {
    compute_distribution_with_rng(formula, iterations, &mut FastRng::with_seed(seed))
}

/// Simulate with a caller-supplied die source.
pub fn compute_distribution_with_rng(
    formula: &str,
    iterations: usize,
    rng: &mut impl Rng,
) -> Result<HistogramResult> {
    let parsed = parser::parse(formula)?;
    if parsed.is_threshold() {
        Ok(threshold_histogram(&parsed, iterations, rng))
    } else {
        Ok(outcome_histogram(&parsed, iterations, rng))
    }
}

/// One lightweight evaluation: signed total only, no group records.
///
/// `scratch` is reused across iterations so the hot loop stays
/// allocation-free once its capacity settles.
fn roll_total(formula: &Formula, rng: &mut impl Rng, scratch: &mut Vec<u32>) -> i64 {
    let mut total = 0i64;
    for term in &formula.terms {
        let value = match &term.term {
            Term::Modifier(n) => *n,
            Term::Group(spec) => {
                scratch.clear();
                scratch.extend((0..spec.count).map(|_| rng.roll(spec.sides)));
                reduce(spec.reduction, scratch)
            }
        };
        total += term.sign.apply(value);
    }
    total
}

fn threshold_histogram(
    formula: &Formula,
    iterations: usize,
    rng: &mut impl Rng,
) -> HistogramResult {
    let (min_possible, max_possible) = possible_success_range(formula);

    let mut frequencies: BTreeMap<i64, u64> = BTreeMap::new();
    let mut total_successes: i64 = 0;
    let mut at_least_one: u64 = 0;
    let mut scratch = Vec::new();

    for _ in 0..iterations {
        let outcome = roll_total(formula, rng, &mut scratch);
        *frequencies.entry(outcome).or_insert(0) += 1;
        total_successes += outcome;
        if outcome > 0 {
            at_least_one += 1;
        }
    }

    for k in min_possible..=max_possible {
        frequencies.entry(k).or_insert(0);
    }

    let mean = total_successes as f64 / iterations as f64;
    let success_probabilities: BTreeMap<i64, f64> = frequencies
        .iter()
        .map(|(&k, &v)| (k, v as f64 / iterations as f64))
        .collect();

    HistogramResult {
        min: min_possible,
        max: max_possible,
        frequencies,
        total_rolls: iterations,
        mean,
        std_dev: 0.0,
        percentiles: Percentiles::default(),
        is_threshold_roll: true,
        threshold_stats: Some(ThresholdStats {
            average_successes: mean,
            probability_of_at_least_one: at_least_one as f64 / iterations as f64,
            success_probabilities,
        }),
    }
}

/// Theoretical success-total bounds: each threshold group contributes its
/// dice count to the additive or subtractive side, flat modifiers shift
/// both sides.
fn possible_success_range(formula: &Formula) -> (i64, i64) {
    let mut min = 0i64;
    let mut max = 0i64;
    for term in &formula.terms {
        match &term.term {
            Term::Group(spec) => {
                if matches!(spec.reduction, Reduction::CountSuccesses(_)) {
                    match term.sign {
                        Sign::Plus => max += spec.count as i64,
                        Sign::Minus => min -= spec.count as i64,
                    }
                }
            }
            Term::Modifier(n) => {
                let n = term.sign.apply(*n);
                min += n;
                max += n;
            }
        }
    }
    (min, max)
}

fn outcome_histogram(formula: &Formula, iterations: usize, rng: &mut impl Rng) -> HistogramResult {
    let mut frequencies: BTreeMap<i64, u64> = BTreeMap::new();
    let mut sum: i64 = 0;
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    let mut scratch = Vec::new();

    for _ in 0..iterations {
        let total = roll_total(formula, rng, &mut scratch);
        *frequencies.entry(total).or_insert(0) += 1;
        sum += total;
        min = min.min(total);
        max = max.max(total);
    }

    let n = iterations as f64;
    let mean = sum as f64 / n;
    let variance = frequencies
        .iter()
        .map(|(&value, &count)| {
            let diff = value as f64 - mean;
            diff * diff * count as f64
        })
        .sum::<f64>()
        / n;

    let percentiles = Percentiles {
        p25: nearest_rank(&frequencies, iterations, 25),
        p50: nearest_rank(&frequencies, iterations, 50),
        p75: nearest_rank(&frequencies, iterations, 75),
        p90: nearest_rank(&frequencies, iterations, 90),
        p95: nearest_rank(&frequencies, iterations, 95),
        p99: nearest_rank(&frequencies, iterations, 99),
    };

    HistogramResult {
        min,
        max,
        frequencies,
        total_rolls: iterations,
        mean,
        std_dev: variance.sqrt(),
        percentiles,
        is_threshold_roll: false,
        threshold_stats: None,
    }
}

/// Value at sorted index `ceil(p/100 * n) - 1`, read off the cumulative
/// frequency walk instead of materializing every outcome.
fn nearest_rank(frequencies: &BTreeMap<i64, u64>, iterations: usize, p: usize) -> i64 {
    let rank = ((p * iterations).div_ceil(100)).max(1) as u64;
    let mut seen = 0u64;
    for (&value, &count) in frequencies {
        seen += count;
        if seen >= rank {
            return value;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::roller::ScriptedRng;

    #[test]
    fn test_threshold_single_iteration() {
        let mut rng = ScriptedRng::new(vec![4, 5, 6, 3]);
        let result = compute_distribution_with_rng("4d6>=5", 1, &mut rng).unwrap();

        assert!(result.is_threshold_roll);
        let stats = result.threshold_stats.as_ref().unwrap();
        assert_eq!(stats.average_successes, 2.0);
        assert_eq!(stats.probability_of_at_least_one, 1.0);
        assert_eq!(result.min, 0);
        assert_eq!(result.max, 4);
        assert_eq!(result.frequencies[&2], 1);
        // The whole possible range is present, zero-filled.
        let keys: Vec<i64> = stats.success_probabilities.keys().copied().collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
        assert_eq!(stats.success_probabilities[&2], 1.0);
        assert_eq!(stats.success_probabilities[&0], 0.0);
    }

    #[test]
    fn test_threshold_combined_groups() {
        let mut rng = ScriptedRng::new(vec![4, 3, 5, 6, 4]);
        let result = compute_distribution_with_rng("2d6>=4 + 3d8>=5", 1, &mut rng).unwrap();

        let stats = result.threshold_stats.as_ref().unwrap();
        assert_eq!(stats.average_successes, 3.0);
        assert_eq!(result.min, 0);
        assert_eq!(result.max, 5);
    }

    #[test]
    fn test_threshold_range_with_subtraction_and_modifier() {
        let result = compute_distribution_seeded("5d10>=8 - 2d10>=6 + 1", 200, 7).unwrap();

        assert!(result.is_threshold_roll);
        // +5 dice, -2 dice, +1 modifier on both bounds.
        assert_eq!(result.min, -1);
        assert_eq!(result.max, 6);
        let stats = result.threshold_stats.as_ref().unwrap();
        let sum: f64 = stats.success_probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.percentiles, Percentiles::default());
    }

    #[test]
    fn test_threshold_probabilities_sum_to_one() {
        let result = compute_distribution_seeded("5d10>=8", 2000, 11).unwrap();
        let stats = result.threshold_stats.as_ref().unwrap();
        let sum: f64 = stats.success_probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Expected successes for 5d10 at 30% per die.
        assert!((stats.average_successes - 1.5).abs() < 0.2);
    }

    #[test]
    fn test_outcome_single_iteration() {
        let mut rng = ScriptedRng::new(vec![3, 4]);
        let result = compute_distribution_with_rng("2d6", 1, &mut rng).unwrap();

        assert!(!result.is_threshold_roll);
        assert!(result.threshold_stats.is_none());
        assert_eq!(result.mean, 7.0);
        assert_eq!(result.min, 7);
        assert_eq!(result.max, 7);
        assert_eq!(result.frequencies[&7], 1);
    }

    #[test]
    fn test_outcome_constant_formula() {
        let result = compute_distribution("1d1+4", 100).unwrap();

        assert_eq!(result.mean, 5.0);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.min, 5);
        assert_eq!(result.max, 5);
        assert_eq!(result.frequencies[&5], 100);
        assert_eq!(result.percentiles.p50, 5);
        assert_eq!(result.percentiles.p99, 5);
    }

    #[test]
    fn test_outcome_percentiles_nearest_rank() {
        // 100 iterations of 1d4 cycling 1,2,3,4: 25 of each outcome.
        let mut rng = ScriptedRng::new(vec![1, 2, 3, 4]);
        let result = compute_distribution_with_rng("1d4", 100, &mut rng).unwrap();

        assert_eq!(result.mean, 2.5);
        assert_eq!(result.percentiles.p25, 1);
        assert_eq!(result.percentiles.p50, 2);
        assert_eq!(result.percentiles.p75, 3);
        assert_eq!(result.percentiles.p90, 4);
        assert_eq!(result.percentiles.p95, 4);
        assert_eq!(result.percentiles.p99, 4);
        assert!((result.std_dev - 1.25f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_frequencies_sum_to_iterations() {
        let result = compute_distribution_seeded("3>4d6 + 2", 1000, 42).unwrap();
        let total: u64 = result.frequencies.values().sum();
        assert_eq!(total, 1000);
        assert_eq!(result.total_rolls, 1000);
    }

    #[test]
    fn test_outcome_range_and_mean() {
        let result = compute_distribution_seeded("2d6", 10_000, 3).unwrap();
        assert!(result.min >= 2);
        assert!(result.max <= 12);
        assert!((result.mean - 7.0).abs() < 0.3);
    }

    #[test]
    fn test_seeded_reproducible() {
        let first = compute_distribution_seeded("2d6+1", 1000, 42).unwrap();
        let second = compute_distribution_seeded("2d6+1", 1000, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validation_aborts_before_iterating() {
        let err = compute_distribution("3d6=7", DEFAULT_ITERATIONS).unwrap_err();
        assert_eq!(
            err,
            Error::ThresholdTooHigh {
                threshold: 7,
                sides: 6,
            }
        );

        let err = compute_distribution("5", 10).unwrap_err();
        assert_eq!(err, Error::NoDiceGroups);
    }

    #[test]
    fn test_frequencies_sorted_ascending() {
        let result = compute_distribution_seeded("2d6-1d4", 500, 9).unwrap();
        let keys: Vec<i64> = result.frequencies.keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }
}
