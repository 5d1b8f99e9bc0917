//! Rules for terminal value formats
//!
//! Each scalar kind owns its message text. A rule reports at most one
//! problem: the first one it finds.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::schema::ScalarKind;
use crate::time::{is_time_offset, is_time_shorthand, seconds_for_duration_shorthand};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:"?([^"]*)"?\s)?(?:<?(.+@[^>]+\.[^>]+)>?)"#).unwrap());

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[A-Fa-f0-9]{6}$").unwrap());

static MEDIA_TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{[.A-Za-z0-9_-]+\}\}$").unwrap());

static SIMPLE_ATTRIBUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]*$").unwrap());

static LOOKUPABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// Validate a scalar value; empty means valid
pub fn validate(kind: ScalarKind, name: &str, required: bool, param: &Value) -> Vec<String> {
    let label = kind.label();
    let problem = match kind {
        ScalarKind::String | ScalarKind::Markdown => text(label, name, required, param),
        ScalarKind::Email => email(name, required, param),
        ScalarKind::SimpleValue => simple_value(name, required, param),
        ScalarKind::Integer => match as_number(param) {
            Some(n) if n.fract() == 0.0 => None,
            _ => Some(format!("Integer param \"{}\" should be an integer.", name)),
        },
        ScalarKind::Number => match as_number(param) {
            Some(_) => None,
            None => Some(format!("Number param \"{}\" should be a number.", name)),
        },
        ScalarKind::Boolean => match param {
            Value::Bool(_) => None,
            _ => Some(format!(
                "Boolean param \"{}\" (\"{}\") should be true or false.",
                name,
                display(param)
            )),
        },
        ScalarKind::Color => color(name, param),
        ScalarKind::Duration => match param.as_str() {
            Some(s) if seconds_for_duration_shorthand(s) > 0.0 => None,
            _ => Some(format!(
                "Duration param \"{}\" (\"{}\") should be a number with \"h\", \"m\", or \"s\".",
                name,
                display(param)
            )),
        },
        ScalarKind::TimeOffset => match param.as_str() {
            Some(s) if is_time_offset(s) => None,
            _ => Some(format!(
                "Time offset param \"{}\" (\"{}\") should be a number suffixed by \"h/m/s\".",
                name,
                display(param)
            )),
        },
        ScalarKind::TimeShorthand => match param.as_str() {
            Some(s) if is_time_shorthand(s) => None,
            _ => Some(format!(
                "Time shorthand param \"{}\" (\"{}\") must be valid.",
                name,
                display(param)
            )),
        },
        ScalarKind::Name => name_grammar(label, name, param),
        ScalarKind::Media => media(name, required, param),
        ScalarKind::Coords => coords(name, param),
        ScalarKind::SimpleAttribute => simple_attribute(name, param),
        ScalarKind::Lookupable => lookupable(name, param),
        ScalarKind::Location => location(name, param),
    };
    problem.into_iter().collect()
}

/// The resource-name grammar shared by `name` fields and references:
/// starts with a letter, then letters, digits, dashes or underscores.
pub fn name_grammar(label: &str, name: &str, param: &Value) -> Option<String> {
    let s = match param.as_str() {
        Some(s) => s,
        None => {
            return Some(format!(
                "{} param \"{}\" (\"{}\") should be a string.",
                label,
                name,
                display(param)
            ))
        }
    };
    if s.is_empty() {
        return Some(format!("{} param \"{}\" should not be blank.", label, name));
    }
    if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Some(format!(
            "{} param \"{}\" (\"{}\") should start with a letter.",
            label, name, s
        ));
    }
    if !NAME_RE.is_match(s) {
        return Some(format!(
            "{} param \"{}\" (\"{}\") should be alphanumeric with dashes or underscores.",
            label, name, s
        ));
    }
    None
}

/// Render a value the way it reads inside a message
pub fn display(param: &Value) -> String {
    match param {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric reading of a value: numbers, and strings that parse as numbers
fn as_number(param: &Value) -> Option<f64> {
    match param {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn text(label: &str, name: &str, required: bool, param: &Value) -> Option<String> {
    match param.as_str() {
        None => Some(format!("{} param \"{}\" should be a string.", label, name)),
        Some("") if required => Some(format!("{} param \"{}\" should not be blank.", label, name)),
        Some(_) => None,
    }
}

fn email(name: &str, required: bool, param: &Value) -> Option<String> {
    if let Some(problem) = text("Email", name, required, param) {
        return Some(problem);
    }
    match param.as_str() {
        Some(s) if s.is_empty() || EMAIL_RE.is_match(s) => None,
        _ => Some(format!("Email param \"{}\" should be a valid email.", name)),
    }
}

fn simple_value(name: &str, required: bool, param: &Value) -> Option<String> {
    match param {
        Value::String(s) if required && s.is_empty() => {
            Some(format!("Simple param \"{}\" should not be blank.", name))
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) => None,
        _ => Some(format!(
            "Simple param \"{}\" should be a string, number or boolean.",
            name
        )),
    }
}

fn color(name: &str, param: &Value) -> Option<String> {
    match param.as_str() {
        None => Some(format!("Color param \"{}\" should be a string.", name)),
        Some("") => Some(format!("Color param \"{}\" should not be blank.", name)),
        Some(s) if !COLOR_RE.is_match(s) => Some(format!(
            "Color param \"{}\" ({}) should be a hex color.",
            name, s
        )),
        Some(_) => None,
    }
}

fn media(name: &str, required: bool, param: &Value) -> Option<String> {
    let s = match param.as_str() {
        Some(s) => s,
        None => return Some(format!("Media param \"{}\" should be a string.", name)),
    };
    if s.is_empty() {
        if required {
            return Some(format!("Media param \"{}\" should not be blank.", name));
        }
        return None;
    }
    let is_url = s.starts_with("https://") || s.starts_with("http://");
    if !is_url && !MEDIA_TEMPLATE_RE.is_match(s) {
        return Some(format!("Media param \"{}\" must be a URL.", name));
    }
    None
}

fn coords(name: &str, param: &Value) -> Option<String> {
    let pair = param
        .as_array()
        .filter(|items| items.len() == 2)
        .and_then(|items| Some((as_number(&items[0])?, as_number(&items[1])?)));
    let (first, second) = match pair {
        Some(pair) => pair,
        None => {
            return Some(format!(
                "Coords param \"{}\" should be an array of two numbers.",
                name
            ))
        }
    };
    for (index, value) in [first, second].into_iter().enumerate() {
        if !(-180.0..=180.0).contains(&value) {
            return Some(format!(
                "Coords param \"{}[{}]\" should be between -180 and 180.",
                name, index
            ));
        }
    }
    None
}

fn simple_attribute(name: &str, param: &Value) -> Option<String> {
    let s = match param.as_str() {
        Some(s) => s,
        None => return Some(format!("Simple attribute param \"{}\" should be a string.", name)),
    };
    if s.is_empty() {
        return Some(format!("Simple attribute param \"{}\" should not be blank.", name));
    }
    if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Some(format!(
            "Simple attribute param \"{}\" (\"{}\") should start with a letter.",
            name, s
        ));
    }
    if !SIMPLE_ATTRIBUTE_RE.is_match(s) {
        return Some(format!(
            "Simple attribute param \"{}\" (\"{}\") should be alphanumeric with underscores.",
            name, s
        ));
    }
    None
}

fn lookupable(name: &str, param: &Value) -> Option<String> {
    let s = match param.as_str() {
        Some(s) => s,
        None => {
            return Some(format!(
                "Lookupable param \"{}\" (\"{}\") should be a string.",
                name,
                display(param)
            ))
        }
    };
    if s.is_empty() {
        return Some(format!("Lookupable param \"{}\" should not be blank.", name));
    }
    for quote in ['"', '\''] {
        if s.starts_with(quote) {
            let inner = &s[1..];
            let well_formed = inner.len() > 1
                && inner.ends_with(quote)
                && !inner[..inner.len() - 1].contains(quote);
            if !well_formed {
                return Some(format!(
                    "Lookupable param \"{}\" (\"{}\") should only have quotes at the beginning and end.",
                    name, s
                ));
            }
            return None;
        }
    }
    if !LOOKUPABLE_RE.is_match(s) {
        return Some(format!(
            "Lookupable param \"{}\" (\"{}\") should be alphanumeric with underscores, dashes and periods.",
            name, s
        ));
    }
    None
}

fn location(name: &str, param: &Value) -> Option<String> {
    let mut problems: Vec<String> = Vec::new();
    match param.as_object() {
        None => problems.push("location should be an object".to_string()),
        Some(fields) => {
            for key in ["title", "address"] {
                if let Some(value) = fields.get(key) {
                    if !value.is_string() {
                        problems.push(format!("{} should be a string", key));
                    }
                }
            }
            match fields.get("coords") {
                None => problems.push("coords is required".to_string()),
                Some(value) => {
                    let valid = value
                        .as_array()
                        .map(|items| items.len() == 2 && items.iter().all(Value::is_number))
                        .unwrap_or(false);
                    if !valid {
                        problems.push("coords should be an array of two numbers".to_string());
                    }
                }
            }
            for key in fields.keys() {
                if !["title", "address", "coords"].contains(&key.as_str()) {
                    problems.push(format!("additional property \"{}\" is not allowed", key));
                }
            }
        }
    }
    if problems.is_empty() {
        return None;
    }
    Some(format!(
        "Location param \"{}\" must be valid: {}.",
        name,
        problems.join(", ")
    ))
}
