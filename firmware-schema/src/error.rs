//! Error envelopes returned by Supabase services.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error body shared by Storage (`statusCode`/`error`/`message`) and PostgREST
/// (`code`/`message`/`details`/`hint`).
///
/// Every field is optional: the two services fill different subsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Storage: short error name, e.g. `Duplicate` or `Bucket not found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// PostgREST: SQLSTATE or `PGRSTxxx` code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Storage repeats the HTTP status as a string, e.g. `"409"`.
    #[serde(
        rename = "statusCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<Value>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl BackendErrorBody {
    /// Best human-readable summary of the error.
    pub fn summary(&self) -> Option<String> {
        let head = self
            .message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())?;

        Some(match (self.code.as_deref(), self.hint.as_deref()) {
            (Some(code), Some(hint)) => format!("{head} (code {code}; hint: {hint})"),
            (Some(code), None) => format!("{head} (code {code})"),
            (None, Some(hint)) => format!("{head} (hint: {hint})"),
            (None, None) => head.to_string(),
        })
    }
}
