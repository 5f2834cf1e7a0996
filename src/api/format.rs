//! Lenient input parsing shared by the key store and the library handlers.
//!
//! Inputs that fail to parse fall back to a safe default instead of failing the
//! request. Every fallback is logged so a silently widened access surface (an
//! unreadable tenant key file, for instance) still shows up in the logs.

use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Parse `raw` as JSON, or return `T::default()` when it is malformed.
///
/// `source` names the input in the warning that accompanies a fallback.
pub fn parse_json_or_default<T>(raw: &str, source: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_str::<T>(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "ignoring malformed JSON, using default");
            T::default()
        }
    }
}

/// Parse an optional text value, treating absent, blank and unparsable input alike.
pub fn parse_lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Trim a text value and drop it when nothing is left.
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
