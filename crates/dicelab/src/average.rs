// ABOUTME: Expected-value math for dice groups.
// ABOUTME: Closed forms for sum/threshold/single-take, enumeration for take-N.

use crate::ast::{Compare, GroupSpec, Reduction, Threshold};

/// Theoretical mean of a group's contribution, before the term sign.
///
/// Uses no randomness. Take-N with `take > 1` enumerates all `sides^count`
/// outcome tuples, which is exponential in `count`; formulas use small dice
/// pools, so this stays cheap in practice.
pub fn expected_average(spec: &GroupSpec) -> f64 {
    let count = spec.count as f64;
    let sides = spec.sides as f64;
    match spec.reduction {
        Reduction::Sum => (sides + 1.0) / 2.0 * count,
        Reduction::CountSuccesses(threshold) => {
            count * success_probability(spec.sides, threshold)
        }
        Reduction::TakeGreatest(1) => greatest_of(spec.count, spec.sides),
        Reduction::TakeLeast(1) => sides + 1.0 - greatest_of(spec.count, spec.sides),
        Reduction::TakeGreatest(take) => enumerate_take(spec.count, spec.sides, take, true),
        Reduction::TakeLeast(take) => enumerate_take(spec.count, spec.sides, take, false),
    }
}

/// Probability that a single die satisfies the threshold.
fn success_probability(sides: u32, threshold: Threshold) -> f64 {
    let sides = sides as f64;
    match threshold.compare {
        Compare::Equal => 1.0 / sides,
        Compare::GreaterOrEqual => (sides - threshold.value as f64 + 1.0) / sides,
        Compare::GreaterThan => (sides - threshold.value as f64) / sides,
    }
}

/// Closed-form mean of the greatest of `count` dice.
fn greatest_of(count: u32, sides: u32) -> f64 {
    let count = count as f64;
    let sides = sides as f64;
    let term = 1.0 - 1.0 / (2.0 * sides);
    sides * (1.0 - term.powf(count + 1.0) / (count + 1.0))
}

/// Exact mean of the sum of the top (or bottom) `take` dice, by walking
/// every equally likely outcome tuple.
fn enumerate_take(count: u32, sides: u32, take: u32, greatest: bool) -> f64 {
    let combinations = (sides as u64).pow(count);
    let mut rolls = vec![0u32; count as usize];
    let mut sum: u64 = 0;

    for mut index in 0..combinations {
        for roll in rolls.iter_mut() {
            *roll = (index % sides as u64) as u32 + 1;
            index /= sides as u64;
        }
        if greatest {
            rolls.sort_unstable_by(|a, b| b.cmp(a));
        } else {
            rolls.sort_unstable();
        }
        sum += rolls[..take as usize].iter().map(|&v| v as u64).sum::<u64>();
    }

    sum as f64 / combinations as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(count: u32, sides: u32, reduction: Reduction) -> GroupSpec {
        GroupSpec {
            count,
            sides,
            reduction,
        }
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {} within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_sum_average() {
        assert_eq!(expected_average(&spec(3, 6, Reduction::Sum)), 10.5);
        assert_eq!(expected_average(&spec(2, 4, Reduction::Sum)), 5.0);
        assert_eq!(expected_average(&spec(4, 8, Reduction::Sum)), 18.0);
    }

    #[test]
    fn test_take_one_average() {
        assert_close(
            expected_average(&spec(3, 6, Reduction::TakeGreatest(1))),
            4.94,
            0.01,
        );
        assert_close(
            expected_average(&spec(3, 6, Reduction::TakeLeast(1))),
            2.06,
            0.01,
        );
    }

    #[test]
    fn test_take_many_average() {
        assert_close(
            expected_average(&spec(4, 6, Reduction::TakeGreatest(2))),
            9.34,
            0.01,
        );
        assert_close(
            expected_average(&spec(4, 6, Reduction::TakeLeast(2))),
            4.66,
            0.01,
        );
    }

    #[test]
    fn test_take_reflection_symmetry() {
        // Mean of the lowest k mirrors the mean of the highest k.
        let high = expected_average(&spec(3, 8, Reduction::TakeGreatest(2)));
        let low = expected_average(&spec(3, 8, Reduction::TakeLeast(2)));
        assert_close(high + low, 2.0 * 2.0 * 4.5, 1e-9);
    }

    #[test]
    fn test_threshold_average() {
        let gte = Reduction::CountSuccesses(Threshold {
            compare: Compare::GreaterOrEqual,
            value: 4,
        });
        assert_eq!(expected_average(&spec(4, 6, gte)), 2.0);

        let gt = Reduction::CountSuccesses(Threshold {
            compare: Compare::GreaterThan,
            value: 5,
        });
        assert_eq!(expected_average(&spec(3, 10, gt)), 1.5);

        let gte_high = Reduction::CountSuccesses(Threshold {
            compare: Compare::GreaterOrEqual,
            value: 15,
        });
        assert_close(expected_average(&spec(2, 20, gte_high)), 0.6, 1e-9);
    }

    #[test]
    fn test_exact_match_average() {
        let eq6 = Reduction::CountSuccesses(Threshold {
            compare: Compare::Equal,
            value: 6,
        });
        assert_close(expected_average(&spec(4, 6, eq6)), 0.667, 0.001);

        let eq5 = Reduction::CountSuccesses(Threshold {
            compare: Compare::Equal,
            value: 5,
        });
        assert_close(expected_average(&spec(3, 10, eq5)), 0.3, 0.001);

        let eq20 = Reduction::CountSuccesses(Threshold {
            compare: Compare::Equal,
            value: 20,
        });
        assert_close(expected_average(&spec(2, 20, eq20)), 0.1, 0.001);
    }
}
