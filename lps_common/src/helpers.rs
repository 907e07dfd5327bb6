use std::{str::FromStr, time::Duration};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a number from an optional string. Missing, empty or malformed values produce `Err` with a message that
/// can be logged before falling back to a default.
pub fn parse_number<T: FromStr>(value: Option<String>) -> Option<Result<T, String>> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.parse::<T>().map_err(|_| format!("'{trimmed}' is not a valid number")))
}

/// Parse a duration given as a whole number of seconds.
pub fn parse_seconds(value: Option<String>) -> Option<Result<Duration, String>> {
    parse_number::<u64>(value).map(|r| r.map(Duration::from_secs))
}
