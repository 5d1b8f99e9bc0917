//! Time grammars used by script fields
//!
//! Shorthand clock times (`3:00pm`, `+1d 4:15pm`) and offsets (`10s`,
//! `-3.5h`) are validated by fixed regular expressions. Digits are ASCII
//! only.

use regex::Regex;
use std::sync::LazyLock;

pub static TIME_SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\+[0-9]d\s)?([0-9]|1[0-2]):[0-5][0-9](a|p|am|pm)$").unwrap()
});

pub static TIME_OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?[hms]$").unwrap());

pub fn is_time_shorthand(value: &str) -> bool {
    TIME_SHORTHAND_RE.is_match(value)
}

pub fn is_time_offset(value: &str) -> bool {
    TIME_OFFSET_RE.is_match(value)
}

/// Convert a duration shorthand like `3s` or `10m` into seconds.
///
/// Anything unparseable, negative or zero yields 0.
pub fn seconds_for_duration_shorthand(shorthand: &str) -> f64 {
    let mut chars = shorthand.chars();
    let unit = match chars.next_back() {
        Some(unit) => unit,
        None => return 0.0,
    };
    let multiplier = match unit {
        's' => 1.0,
        'm' => 60.0,
        'h' => 3600.0,
        _ => return 0.0,
    };
    match chars.as_str().parse::<f64>() {
        Ok(num) if num.is_finite() && num > 0.0 => num * multiplier,
        _ => 0.0,
    }
}

/// Like `seconds_for_duration_shorthand`, but allows a leading minus
pub fn seconds_for_offset_shorthand(shorthand: &str) -> f64 {
    match shorthand.strip_prefix('-') {
        Some(rest) => -seconds_for_duration_shorthand(rest),
        None => seconds_for_duration_shorthand(shorthand),
    }
}
