//! "Parse with default" accessors for API payloads.
//!
//! Places payloads are loosely typed: ratings may be missing, null, numeric
//! strings or garbage. Every numeric field goes through one of these at the
//! ingestion boundary so scoring code only ever sees clean values.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberValue {
    Float(f64),
    String(String),
    Other(IgnoredAny),
}

impl NumberValue {
    fn into_f64(self) -> Option<f64> {
        let value = match self {
            NumberValue::Float(f) => f,
            NumberValue::String(s) => s.trim().parse::<f64>().ok()?,
            NumberValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Real number, or 0 when absent/null/non-numeric.
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberValue::deserialize(deserializer)?
        .into_f64()
        .unwrap_or(0.0))
}

/// Non-negative integer, or 0 when absent/null/negative/non-numeric.
/// Fractional counts are truncated.
pub fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberValue::deserialize(deserializer)?
        .into_f64()
        .unwrap_or(0.0);
    if value <= 0.0 {
        return Ok(0);
    }
    Ok(value as u64)
}

/// Real number, or `None` when absent/null/non-numeric. Used for coordinates,
/// where a missing value must stay distinguishable from 0.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberValue::deserialize(deserializer)?.into_f64())
}

/// Any value of the expected shape, or `None` when null or shaped wrong.
pub fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Any value of the expected shape, or `T::default()` when null or shaped wrong.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(or_none(deserializer)?.unwrap_or_default())
}
