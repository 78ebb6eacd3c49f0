// ABOUTME: Core library for evaluating TTRPG dice formulas.
// ABOUTME: Parses signed-term formulas, rolls them, and builds distributions.

//! # Dicelab
//!
//! A dice formula evaluator and statistics engine for tabletop RPGs.
//!
//! ## Quick Start
//!
//! ```
//! use dicelab::{evaluate, compute_distribution};
//!
//! // Roll a formula once
//! let result = evaluate("3d10 + 2d8 - 1").unwrap();
//! assert!(result.total >= 4 && result.total <= 45);
//!
//! // Build an outcome distribution
//! let stats = compute_distribution("2d6", 10_000).unwrap();
//! assert!((stats.mean - 7.0).abs() < 0.5);
//! ```
//!
//! ## Supported Formulas
//!
//! - Dice sums and flat modifiers: `3d10`, `2d6 + 5`, `6d6 - 1d4 - 1`
//! - Take greatest/least: `>2d20`, `<3d6`, `3>4d6`, `2<4d6`
//! - Success counting: `5d10>=8`, `5d10>8`, `4d8=6`
//!
//! Every evaluation returns per-group dice breakdowns alongside the total;
//! the statistics engine simulates a formula many times to report mean,
//! spread, percentiles, and (for success-counting formulas) the full
//! success-probability distribution.

pub mod ast;
pub mod average;
pub mod compose;
pub mod error;
pub mod parser;
pub mod roller;
pub mod sim;

pub use ast::{Compare, Formula, GroupSpec, Reduction, Sign, SignedTerm, Term, Threshold};
pub use average::expected_average;
pub use compose::add_to_formula;
pub use error::{Error, Result};
pub use roller::{evaluate_parsed, DiceGroup, DieRoll, FastRng, Rng, RollResult};
pub use sim::{
    compute_distribution, compute_distribution_seeded, compute_distribution_with_rng,
    HistogramResult, Percentiles, ThresholdStats, DEFAULT_ITERATIONS,
};

/// Parse and evaluate a formula in one step.
///
/// # Examples
///
/// ```
/// let result = dicelab::evaluate("1d1 + 1").unwrap();
/// assert_eq!(result.total, 2);
/// assert_eq!(result.formula, "1d1+1");
/// ```
pub fn evaluate(formula: &str) -> Result<RollResult> {
    let parsed = parser::parse(formula)?;
    Ok(roller::evaluate_parsed(&parsed, &mut FastRng::new()))
}

/// Parse and evaluate with a custom die source.
///
/// Useful for testing or when you need reproducible rolls.
///
/// # Examples
///
/// ```
/// use dicelab::{evaluate_with_rng, FastRng};
///
/// let mut rng = FastRng::with_seed(42);
/// let result = evaluate_with_rng("3d10 + 2", &mut rng).unwrap();
/// assert_eq!(result.groups[0].dice.len(), 3);
/// ```
pub fn evaluate_with_rng(formula: &str, rng: &mut impl Rng) -> Result<RollResult> {
    let parsed = parser::parse(formula)?;
    Ok(roller::evaluate_parsed(&parsed, rng))
}

/// Parse a formula without rolling it.
///
/// # Examples
///
/// ```
/// use dicelab::{parse, Reduction, Term};
///
/// let formula = parse("3>4d6").unwrap();
/// match &formula.terms[0].term {
///     Term::Group(spec) => assert_eq!(spec.reduction, Reduction::TakeGreatest(3)),
///     _ => panic!("Expected a dice group"),
/// }
/// ```
pub fn parse(input: &str) -> Result<Formula> {
    parser::parse(input)
}
