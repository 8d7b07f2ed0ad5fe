use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::CheckError;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// Raw base64 or a full `data:` URL.
    #[serde(alias = "image_b64")]
    pub image: String,
    #[serde(deserialize_with = "lax_integer")]
    pub expected: i64,
}

/// Accept `12`, `12.0` and `"12"`; reject fractions, booleans and other text.
fn lax_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_i64().or_else(|| integral_f64(n.as_f64()?)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", value)))
}

fn integral_f64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    pub fn success(raw: String, number: Number, correct: bool) -> Self {
        Self {
            ok: true,
            raw: Some(raw),
            number: Some(number),
            correct: Some(correct),
            error: None,
        }
    }

    /// Failure carrying the cleaned model text for diagnostics.
    pub fn failure_with_raw(raw: String, err: &CheckError) -> Self {
        Self {
            raw: Some(raw),
            ..Self::failure(err)
        }
    }

    pub fn failure(err: &CheckError) -> Self {
        Self {
            ok: false,
            raw: None,
            number: None,
            correct: None,
            error: Some(err.to_string()),
        }
    }
}
