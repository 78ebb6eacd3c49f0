// ABOUTME: Dice rolling and detailed formula evaluation.
// ABOUTME: Produces per-group dice breakdowns with expected averages.

use crate::ast::{Formula, GroupSpec, Reduction, Sign, Term};
use crate::average::expected_average;
use std::fmt;

/// Trait for the random die source, allowing tests to script outcomes.
pub trait Rng {
    /// Roll one die, uniform over `[1, sides]`.
    fn roll(&mut self, sides: u32) -> u32;
}

/// Default die source backed by fastrand.
pub struct FastRng(fastrand::Rng);

impl FastRng {
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl Default for FastRng {
    fn default() -> Self {
        Self::new()
    }
}

impl Rng for FastRng {
    fn roll(&mut self, sides: u32) -> u32 {
        self.0.u32(1..=sides)
    }
}

/// Outcome of a single die, kept in the order it was rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DieRoll {
    pub value: u32,
    pub sides: u32,
}

/// One evaluated dice group of a formula.
///
/// Built fully formed: outcomes first, then `value` and `expected_average`
/// as pure functions of the outcomes and the descriptor. `dice` always has
/// `count` entries even when only a take-N subset contributes to `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiceGroup {
    pub count: u32,
    pub sides: u32,
    pub reduction: Reduction,
    /// Every outcome, in rolled order.
    pub dice: Vec<DieRoll>,
    /// The group's signed contribution to the total.
    pub value: i64,
    /// Theoretical mean contribution, independent of this roll.
    pub expected_average: f64,
}

impl DiceGroup {
    /// The descriptor this group was rolled from.
    pub fn spec(&self) -> GroupSpec {
        GroupSpec {
            count: self.count,
            sides: self.sides,
            reduction: self.reduction,
        }
    }
}

impl fmt::Display for DiceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks: Vec<String> = match self.reduction {
            Reduction::Sum => self.dice.iter().map(|d| d.value.to_string()).collect(),
            Reduction::CountSuccesses(t) => self
                .dice
                .iter()
                .map(|d| {
                    if t.compare.check(d.value, t.value) {
                        format!("{}*", d.value)
                    } else {
                        d.value.to_string()
                    }
                })
                .collect(),
            Reduction::TakeGreatest(n) | Reduction::TakeLeast(n) => {
                let mut order: Vec<usize> = (0..self.dice.len()).collect();
                if matches!(self.reduction, Reduction::TakeGreatest(_)) {
                    order.sort_by_key(|&i| std::cmp::Reverse(self.dice[i].value));
                } else {
                    order.sort_by_key(|&i| self.dice[i].value);
                }
                let mut kept = vec![false; self.dice.len()];
                for &i in order.iter().take(n as usize) {
                    kept[i] = true;
                }
                self.dice
                    .iter()
                    .enumerate()
                    .map(|(i, d)| {
                        if kept[i] {
                            d.value.to_string()
                        } else {
                            format!("({})", d.value)
                        }
                    })
                    .collect()
            }
        };
        write!(f, "{}[{}] = {}", self.spec(), marks.join(", "), self.value)
    }
}

/// Result of evaluating a formula once.
#[derive(Debug, Clone, PartialEq)]
pub struct RollResult {
    /// Canonical (whitespace-stripped) formula, reusable for rerolls.
    pub formula: String,
    /// Evaluated dice groups, in formula order.
    pub groups: Vec<DiceGroup>,
    /// Sum of all group values plus the flat modifier.
    pub total: i64,
}

impl RollResult {
    /// The flat-modifier portion of the total.
    pub fn modifier(&self) -> i64 {
        self.total - self.groups.iter().map(|g| g.value).sum::<i64>()
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.formula, self.total)
    }
}

/// Evaluate an already parsed formula with the given die source.
pub fn evaluate_parsed(formula: &Formula, rng: &mut impl Rng) -> RollResult {
    let mut groups = Vec::new();
    let mut modifier: i64 = 0;

    for term in &formula.terms {
        match &term.term {
            Term::Modifier(n) => modifier += term.sign.apply(*n),
            Term::Group(spec) => groups.push(roll_group(spec, term.sign, rng)),
        }
    }

    let total = groups.iter().map(|g| g.value).sum::<i64>() + modifier;
    RollResult {
        formula: formula.text.clone(),
        groups,
        total,
    }
}

fn roll_group(spec: &GroupSpec, sign: Sign, rng: &mut impl Rng) -> DiceGroup {
    let dice: Vec<DieRoll> = (0..spec.count)
        .map(|_| DieRoll {
            value: rng.roll(spec.sides),
            sides: spec.sides,
        })
        .collect();

    let mut values: Vec<u32> = dice.iter().map(|d| d.value).collect();
    let value = sign.apply(reduce(spec.reduction, &mut values));

    DiceGroup {
        count: spec.count,
        sides: spec.sides,
        reduction: spec.reduction,
        dice,
        value,
        expected_average: expected_average(spec),
    }
}

/// Reduce rolled values to a group's unsigned contribution.
///
/// Shared by the detailed evaluator and the statistics fast path so the two
/// can never disagree on reduction semantics. Reorders `rolls` when a take-N
/// reduction needs to sort.
pub(crate) fn reduce(reduction: Reduction, rolls: &mut [u32]) -> i64 {
    match reduction {
        Reduction::Sum => rolls.iter().map(|&v| v as i64).sum(),
        Reduction::TakeGreatest(n) => {
            rolls.sort_unstable_by(|a, b| b.cmp(a));
            rolls[..n as usize].iter().map(|&v| v as i64).sum()
        }
        Reduction::TakeLeast(n) => {
            rolls.sort_unstable();
            rolls[..n as usize].iter().map(|&v| v as i64).sum()
        }
        Reduction::CountSuccesses(t) => rolls
            .iter()
            .filter(|&&v| t.compare.check(v, t.value))
            .count() as i64,
    }
}

/// A die source that replays a scripted sequence of outcomes.
#[cfg(test)]
pub(crate) struct ScriptedRng {
    values: Vec<u32>,
    index: usize,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

#[cfg(test)]
impl Rng for ScriptedRng {
    fn roll(&mut self, _sides: u32) -> u32 {
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }
}
