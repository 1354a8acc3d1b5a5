//! Lenient deserializers shared by the TOML and environment layers.
//!
//! Env values always arrive as strings (`FIRMWARE_BUCKET_PUBLIC=TRUE`), while a TOML file may
//! carry `github_sha = 1234567` as a number or `firmware_bucket_public = true` as a bool. These
//! helpers accept either shape.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(super) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    value_to_string(v).ok_or_else(|| serde::de::Error::custom("expected a string or a number"))
}

/// Blank or whitespace-only strings become `None`.
pub(super) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => value_to_string(v)
            .map(|s| Some(s).filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| serde::de::Error::custom("expected a string or a number")),
    }
}

pub(super) fn bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(serde::de::Error::custom("expected 0 or 1")),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {other:?}"
            ))),
        },
        _ => Err(serde::de::Error::custom("expected a boolean")),
    }
}
