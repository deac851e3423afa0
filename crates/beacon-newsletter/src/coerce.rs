//! Default-on-missing rules for numeric fields.
//!
//! | field                                   | source                 | missing / invalid |
//! |-----------------------------------------|------------------------|-------------------|
//! | views                                   | `views_count@count`    | `0`               |
//! | reaction count                          | `reaction@count`       | `0`               |
//! | creation, name and description times    | JSON string or number  | `None`            |
//! | subscriber count                        | JSON string or number  | `None`            |
//! | query error code                        | `extensions.error_code`| `400`             |
//!
//! Other nested payload fields that arrive with the wrong JSON type read as
//! `None`, the same as when they are missing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Code used when the server reports an error without one.
pub const DEFAULT_ERROR_CODE: u16 = 400;

/// Non-negative count from a node attribute. Views and reaction counts.
pub fn count_attr(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Integer from a JSON value that may arrive as a number or a numeric string.
pub fn lenient_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Status code of a query error. Zero and out-of-range values count as absent.
pub fn error_code(value: Option<&Value>) -> u16 {
    lenient_int(value)
        .and_then(|code| u16::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(DEFAULT_ERROR_CODE)
}

/// `deserialize_with` adapter for [`lenient_int`].
pub fn deserialize_lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(lenient_int(value.as_ref()))
}

/// `deserialize_with` adapter that turns a value of the wrong shape into `None`.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
