//! Lenient deserializers for inbound payloads.
//!
//! Form posts from the admin front-end are not strictly typed: coordinates
//! may arrive as numbers or numeric strings, optional fields as `null` or
//! missing, and tag lists may contain junk. These helpers never fail on a
//! wrong JSON type. They map it to "absent" and leave the decision to the
//! validation layer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A number, or a string containing a number. Anything else is `None`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A string. Anything else, including `null`, is `None`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// The string entries of an array. Non-string entries are dropped and a
/// non-array value counts as an empty list.
pub fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => vec![],
    })
}
