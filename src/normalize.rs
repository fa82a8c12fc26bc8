//! Normalize
//!
//! The single boundary between loosely typed backend JSON and the canonical types in
//! this crate. Field-name variants (snake_case, camelCase, `_id`) and numbers that
//! arrive as strings are resolved here, so nothing downstream inspects raw JSON.
//!
//! Every helper is total: malformed input yields `None`, never a panic.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::money::sanitize_amount;

/// Returns the first of `keys` present on `value` with a non-null value.
pub fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find(|found| !found.is_null())
}

/// Reads a finite amount from a JSON number or a strictly numeric string.
pub fn amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| number.as_f64().map(sanitize_amount)),
        Value::String(text) => {
            let trimmed = text.trim();

            if trimmed.is_empty() {
                return None;
            }

            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

/// Reads the first present amount among `keys`.
pub fn amount_field(value: &Value, keys: &[&str]) -> Option<Decimal> {
    field(value, keys).and_then(amount)
}

/// Reads a non-empty string, accepting numbers as their textual form.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();

            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Reads the first present string among `keys`.
pub fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(text)
}

/// Reads a whole number, truncating fractional amounts toward zero.
pub fn integer_field(value: &Value, keys: &[&str]) -> Option<i64> {
    let amount = amount_field(value, keys)?;

    i64::try_from(amount.trunc()).ok()
}

/// Identifier of a possibly populated reference: either the string itself or the
/// `_id`/`id` of an embedded object.
pub fn reference(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => text_field(value, &["_id", "id"]),
        other => text(other),
    }
}

/// Image URL from either a plain string or an attachment object.
pub fn image(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => text_field(value, &["thumbnail", "original", "original2", "url"]),
        other => text(other),
    }
}

/// Parses the leading numeric prefix of `text`, the way lenient float parsers do
/// (`"4%"` reads as `4`, `"abc"` reads as nothing).
pub fn leading_number(text: &str) -> Option<Decimal> {
    let trimmed = text.trim_start();
    let end = numeric_prefix_len(trimmed);
    let prefix = trimmed.get(..end)?;

    if !prefix.bytes().any(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let unsigned = prefix.strip_prefix('+').unwrap_or(prefix);
    let canonical = match unsigned.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{rest}"),
        _ if unsigned.starts_with('.') => format!("0{unsigned}"),
        _ => unsigned.to_string(),
    };

    if canonical.contains(['e', 'E']) {
        Decimal::from_scientific(&canonical).ok()
    } else {
        Decimal::from_str(&canonical).ok()
    }
}

fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    end += count_digits(bytes.get(end..).unwrap_or_default());

    if bytes.get(end) == Some(&b'.') {
        let fraction = count_digits(bytes.get(end + 1..).unwrap_or_default());

        if fraction > 0 {
            end += 1 + fraction;
        }
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;

        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }

        let exponent_digits = count_digits(bytes.get(exponent_end..).unwrap_or_default());

        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    end
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}
