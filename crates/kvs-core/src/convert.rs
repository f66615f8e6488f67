//! String conversions used by the default value converters

use std::fmt::Display;
use std::str::FromStr;

/// Parse with [`FromStr`], rendering the error as text
///
/// # Errors
/// Returns the parser's error message
pub fn parse_from_str<V>(raw: &str) -> Result<V, String>
where
    V: FromStr,
    V::Err: Display,
{
    raw.parse::<V>().map_err(|e| e.to_string())
}

/// Format with [`Display`]
#[inline]
#[must_use]
pub fn format_display<V: Display>(value: &V) -> Option<String> {
    Some(value.to_string())
}

/// Parse a boolean leniently
///
/// Accepts `true/false`, `1/0`, `on/off` and `yes/no`, ignoring case and
/// surrounding whitespace. Checkbox posts send `on`.
///
/// # Errors
/// Returns error for any other text
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(format!("not a boolean: {other:?}")),
    }
}
