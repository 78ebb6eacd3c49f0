// ABOUTME: Parsed-formula data types for dice formulas.
// ABOUTME: Represents signed terms like "3d10", ">2d20", "3>4d6", "5d10>=8".

use std::fmt;

/// A comparison operator for threshold (success-counting) groups.
///
/// `<` is deliberately absent: a leading `<` always means take-least,
/// never a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    GreaterOrEqual,
    GreaterThan,
    Equal,
}

impl Compare {
    /// Check whether a rolled value satisfies this comparison.
    pub fn check(&self, roll: u32, target: u32) -> bool {
        match self {
            Compare::GreaterOrEqual => roll >= target,
            Compare::GreaterThan => roll > target,
            Compare::Equal => roll == target,
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compare::GreaterOrEqual => write!(f, ">="),
            Compare::GreaterThan => write!(f, ">"),
            Compare::Equal => write!(f, "="),
        }
    }
}

/// A per-die success condition, e.g. the `>=8` in `5d10>=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub compare: Compare,
    pub value: u32,
}

/// How a group's rolled dice reduce to a single value.
///
/// Take-N and threshold counting are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Sum every die.
    Sum,
    /// Sum only the N highest dice.
    TakeGreatest(u32),
    /// Sum only the N lowest dice.
    TakeLeast(u32),
    /// Count dice meeting the threshold instead of summing.
    CountSuccesses(Threshold),
}

/// The sign a term carries into the formula total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Apply this sign to a term's reduced value.
    pub fn apply(&self, value: i64) -> i64 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }
}

/// A parsed dice group descriptor: count, sides, and reduction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    /// Number of dice to roll.
    pub count: u32,
    /// Faces per die.
    pub sides: u32,
    /// Reduction applied to the rolled dice.
    pub reduction: Reduction,
}

impl fmt::Display for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reduction {
            Reduction::Sum => write!(f, "{}d{}", self.count, self.sides),
            Reduction::TakeGreatest(1) => write!(f, ">{}d{}", self.count, self.sides),
            Reduction::TakeGreatest(n) => write!(f, "{}>{}d{}", n, self.count, self.sides),
            Reduction::TakeLeast(1) => write!(f, "<{}d{}", self.count, self.sides),
            Reduction::TakeLeast(n) => write!(f, "{}<{}d{}", n, self.count, self.sides),
            Reduction::CountSuccesses(t) => {
                write!(f, "{}d{}{}{}", self.count, self.sides, t.compare, t.value)
            }
        }
    }
}

/// One classified term of a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A bare integer added directly to the total.
    Modifier(i64),
    /// A dice group.
    Group(GroupSpec),
}

/// A term together with the sign it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTerm {
    pub sign: Sign,
    pub term: Term,
}

/// A fully parsed and validated formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    /// Canonical (whitespace-stripped) formula text.
    pub text: String,
    /// The signed terms, in source order.
    pub terms: Vec<SignedTerm>,
}

impl Formula {
    /// True if any term counts successes against a threshold.
    ///
    /// Threshold formulas get a success-probability distribution from the
    /// statistics engine instead of percentile statistics.
    pub fn is_threshold(&self) -> bool {
        self.terms.iter().any(|t| {
            matches!(
                t.term,
                Term::Group(GroupSpec {
                    reduction: Reduction::CountSuccesses(_),
                    ..
                })
            )
        })
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_check() {
        assert!(Compare::GreaterOrEqual.check(8, 8));
        assert!(!Compare::GreaterThan.check(8, 8));
        assert!(Compare::GreaterThan.check(9, 8));
        assert!(Compare::Equal.check(6, 6));
        assert!(!Compare::Equal.check(5, 6));
    }

    #[test]
    fn test_sign_apply() {
        assert_eq!(Sign::Plus.apply(14), 14);
        assert_eq!(Sign::Minus.apply(14), -14);
        assert_eq!(Sign::Minus.apply(0), 0);
    }

    #[test]
    fn test_group_spec_display() {
        let sum = GroupSpec {
            count: 3,
            sides: 10,
            reduction: Reduction::Sum,
        };
        assert_eq!(sum.to_string(), "3d10");

        let take_one = GroupSpec {
            count: 3,
            sides: 10,
            reduction: Reduction::TakeGreatest(1),
        };
        assert_eq!(take_one.to_string(), ">3d10");

        let take_three = GroupSpec {
            count: 4,
            sides: 6,
            reduction: Reduction::TakeGreatest(3),
        };
        assert_eq!(take_three.to_string(), "3>4d6");

        let least = GroupSpec {
            count: 4,
            sides: 6,
            reduction: Reduction::TakeLeast(2),
        };
        assert_eq!(least.to_string(), "2<4d6");

        let threshold = GroupSpec {
            count: 5,
            sides: 10,
            reduction: Reduction::CountSuccesses(Threshold {
                compare: Compare::GreaterOrEqual,
                value: 8,
            }),
        };
        assert_eq!(threshold.to_string(), "5d10>=8");
    }
}
