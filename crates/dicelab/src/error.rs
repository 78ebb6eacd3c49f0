// ABOUTME: Error types for the dicelab library.
// ABOUTME: Covers formula parsing and validation failures.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid formula part: {0}")]
    MalformedTerm(String),

    #[error("No valid dice groups found in formula")]
    NoDiceGroups,

    #[error("Invalid threshold {threshold} for d{sides}: cannot roll lower than 1")]
    ThresholdTooLow { threshold: u32, sides: u32 },

    #[error("Invalid threshold {threshold} for d{sides}: cannot roll higher than {sides}")]
    ThresholdTooHigh { threshold: u32, sides: u32 },

    #[error("Cannot take {take} dice from {count} dice")]
    TakeCountExceedsDiceCount { take: u32, count: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
