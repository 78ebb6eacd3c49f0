// ABOUTME: Parser for dice formulas: term splitting and group classification.
// ABOUTME: Converts strings like "3d10 + 2d8 - 1" into validated terms.

use crate::ast::{Compare, Formula, GroupSpec, Reduction, Sign, SignedTerm, Term, Threshold};
use crate::error::{Error, Result};

/// Parse a formula string into a validated [`Formula`].
///
/// Whitespace is stripped first; the stripped text becomes the canonical
/// formula. The text is then split into signed terms at every `+`/`-` and
/// each term is classified as a flat modifier or a dice group. All
/// validation happens here, before any dice are rolled.
///
/// # Examples
///
/// ```
/// use dicelab::{parse, Reduction, Term};
///
/// let formula = parse("3d10 + 2d8 - 1").unwrap();
/// assert_eq!(formula.text, "3d10+2d8-1");
/// assert_eq!(formula.terms.len(), 3);
/// match &formula.terms[0].term {
///     Term::Group(spec) => {
///         assert_eq!(spec.count, 3);
///         assert_eq!(spec.sides, 10);
///         assert_eq!(spec.reduction, Reduction::Sum);
///     }
///     _ => panic!("Expected a dice group"),
/// }
/// ```
pub fn parse(input: &str) -> Result<Formula> {
    let text: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    let mut terms = Vec::new();
    let mut group_count = 0;
    for raw in split_terms(&text) {
        let (sign, body) = match raw.bytes().next() {
            Some(b'+') => (Sign::Plus, &raw[1..]),
            Some(b'-') => (Sign::Minus, &raw[1..]),
            _ => (Sign::Plus, raw),
        };
        if body.is_empty() {
            return Err(Error::MalformedTerm(raw.to_string()));
        }
        let term = classify(body)?;
        if matches!(term, Term::Group(_)) {
            group_count += 1;
        }
        terms.push(SignedTerm { sign, term });
    }

    if group_count == 0 {
        return Err(Error::NoDiceGroups);
    }

    Ok(Formula { text, terms })
}

/// Split a whitespace-free formula into terms, one per `+`/`-` sign.
///
/// The split happens immediately before each sign, so every term after the
/// first carries its own operator. A sign at position zero belongs to the
/// first term.
fn split_terms(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        if (b == b'+' || b == b'-') && i > start {
            parts.push(&s[start..i]);
            start = i;
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

/// Classify one sign-stripped term.
///
/// Accepted shapes, in priority order: bare integer, threshold group
/// (`NdM>=V`, `NdM>V`, `NdM=V`), take-N group (`>NdM`, `<NdM`, `K>NdM`,
/// `K<NdM`), plain sum group (`NdM`). Anything else is malformed.
fn classify(body: &str) -> Result<Term> {
    let malformed = || Error::MalformedTerm(body.to_string());

    if body.bytes().all(|b| b.is_ascii_digit()) {
        let n: u32 = body.parse().map_err(|_| malformed())?;
        return Ok(Term::Modifier(n as i64));
    }

    let (lead, rest) = split_digits(body);
    match rest.bytes().next() {
        Some(b'<') | Some(b'>') => {
            let greatest = rest.starts_with('>');
            let take = if lead.is_empty() {
                1
            } else {
                parse_positive(lead).ok_or_else(malformed)?
            };
            let (count, sides, tail) = scan_dice(&rest[1..]).ok_or_else(malformed)?;
            if !tail.is_empty() {
                return Err(malformed());
            }
            if take > count {
                return Err(Error::TakeCountExceedsDiceCount { take, count });
            }
            let reduction = if greatest {
                Reduction::TakeGreatest(take)
            } else {
                Reduction::TakeLeast(take)
            };
            Ok(Term::Group(GroupSpec {
                count,
                sides,
                reduction,
            }))
        }
        Some(b'd') | Some(b'D') if !lead.is_empty() => {
            let (count, sides, tail) = scan_dice(body).ok_or_else(malformed)?;
            if tail.is_empty() {
                return Ok(Term::Group(GroupSpec {
                    count,
                    sides,
                    reduction: Reduction::Sum,
                }));
            }
            let (compare, digits) = strip_compare(tail).ok_or_else(malformed)?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            let value: u32 = digits.parse().map_err(|_| malformed())?;
            if value < 1 {
                return Err(Error::ThresholdTooLow {
                    threshold: value,
                    sides,
                });
            }
            if value > sides {
                return Err(Error::ThresholdTooHigh {
                    threshold: value,
                    sides,
                });
            }
            Ok(Term::Group(GroupSpec {
                count,
                sides,
                reduction: Reduction::CountSuccesses(Threshold { compare, value }),
            }))
        }
        _ => Err(malformed()),
    }
}

/// Scan a `NdM` dice body, returning count, sides, and the unconsumed tail.
fn scan_dice(s: &str) -> Option<(u32, u32, &str)> {
    let (count_digits, rest) = split_digits(s);
    let count = parse_positive(count_digits)?;
    let rest = match rest.bytes().next() {
        Some(b'd') | Some(b'D') => &rest[1..],
        _ => return None,
    };
    let (sides_digits, tail) = split_digits(rest);
    let sides = parse_positive(sides_digits)?;
    Some((count, sides, tail))
}

/// Split a string at the end of its leading ASCII-digit span.
fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn parse_positive(digits: &str) -> Option<u32> {
    let n: u32 = digits.parse().ok()?;
    (n >= 1).then_some(n)
}

fn strip_compare(s: &str) -> Option<(Compare, &str)> {
    if let Some(rest) = s.strip_prefix(">=") {
        Some((Compare::GreaterOrEqual, rest))
    } else if let Some(rest) = s.strip_prefix('>') {
        Some((Compare::GreaterThan, rest))
    } else if let Some(rest) = s.strip_prefix('=') {
        Some((Compare::Equal, rest))
    } else {
        None
    }
}
