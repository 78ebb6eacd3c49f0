// ABOUTME: Formula-editing helper for building formulas incrementally.
// ABOUTME: Merges quick-add buttons ("1d6", "+3") into an existing formula string.

/// Append a dice group or modifier to a formula string.
///
/// An addition like `"1d6"` merges into a trailing group with the same
/// sides (`"1d6"` + `"1d6"` becomes `"2d6"`); an addition like `"+3"` folds
/// into a trailing flat modifier (`"1d6 + 2"` becomes `"1d6 + 5"`).
/// Anything else is appended as a new ` + ` term. Operator spacing is
/// normalized to single spaces on the way out.
///
/// # Examples
///
/// ```
/// use dicelab::add_to_formula;
///
/// assert_eq!(add_to_formula("1d6", "1d6"), "2d6");
/// assert_eq!(add_to_formula("1d6 + 2", "+3"), "1d6 + 5");
/// assert_eq!(add_to_formula("2d10", "1d4"), "2d10 + 1d4");
/// ```
pub fn add_to_formula(current: &str, addition: &str) -> String {
    let formula = current.trim();
    if formula.is_empty() {
        return addition.to_string();
    }

    let parts = split_keeping_operators(formula);
    let last = parts.last().map(|p| p.trim()).unwrap_or("");

    if let Some(amount) = addition.strip_prefix('+') {
        if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) {
            if let (Ok(current_mod), Ok(new_mod)) = (last.parse::<u64>(), amount.parse::<u64>()) {
                let prefix: String = parts[..parts.len() - 1].concat();
                return format!(
                    "{}{}",
                    normalize_operator_spacing(&prefix),
                    current_mod + new_mod
                );
            }
        }
        return format!("{} + {}", formula, amount);
    }

    if let Some((count, sides)) = split_dice(addition) {
        if let Some((last_count, last_sides)) = split_dice(last) {
            if last_sides == sides {
                if let (Ok(a), Ok(b)) = (last_count.parse::<u64>(), count.parse::<u64>()) {
                    let prefix: String = parts[..parts.len() - 1].concat();
                    return format!(
                        "{}{}d{}",
                        normalize_operator_spacing(&prefix),
                        a + b,
                        sides
                    );
                }
            }
        }
    }

    format!("{} + {}", normalize_operator_spacing(formula), addition)
}

/// Split a `NdM` string into its count and sides digit spans.
fn split_dice(s: &str) -> Option<(&str, &str)> {
    let (count, sides) = s.split_once('d')?;
    if count.is_empty() || sides.is_empty() {
        return None;
    }
    if !count.bytes().all(|b| b.is_ascii_digit()) || !sides.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((count, sides))
}

/// Split a formula into alternating term and operator chunks, keeping each
/// operator together with its surrounding whitespace.
fn split_keeping_operators(s: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '+' || c == '-' {
            let mut sep = String::new();
            while buf.ends_with(|ch: char| ch.is_whitespace()) {
                sep.insert(0, buf.pop().unwrap());
            }
            if !buf.is_empty() {
                parts.push(std::mem::take(&mut buf));
            }
            sep.push(c);
            while matches!(chars.peek(), Some(ch) if ch.is_whitespace()) {
                sep.push(chars.next().unwrap());
            }
            parts.push(sep);
        } else {
            buf.push(c);
        }
    }
    if !buf.is_empty() {
        parts.push(buf);
    }
    parts
}

/// Rewrite every `+`/`-` with exactly one space on each side.
fn normalize_operator_spacing(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '+' || c == '-' {
            while out.ends_with(|ch: char| ch.is_whitespace()) {
                out.pop();
            }
            out.push(' ');
            out.push(c);
            out.push(' ');
            while matches!(chars.peek(), Some(ch) if ch.is_whitespace()) {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}
