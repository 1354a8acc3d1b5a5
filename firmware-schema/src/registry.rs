//! PostgREST row schema for the firmware registry and the user lookups (`/rest/v1`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Insert payload for the `firmware` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFirmwareRecord {
    pub name: String,
    pub version: String,
    /// Firmware category, e.g. `himax`. Named `r#type` because `type` is a Rust keyword.
    pub r#type: String,
    /// Object path inside the firmware bucket.
    pub location_path: String,
    pub file_size_bytes: u64,
    pub release_notes: String,
    pub is_active: bool,
    pub modified_by: Uuid,
}

/// A `firmware` row as returned with `Prefer: return=representation`.
///
/// The row is already committed when this arrives, so columns stay untyped: a `timestamp`
/// without zone or a `null` flag is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareRecord {
    /// Primary key; its type belongs to the table, not to us.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
}

impl FirmwareRecord {
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// String column, `None` when absent, `null` or not a string.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.column(name).and_then(Value::as_str)
    }
}

/// Projection of `users?select=id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
}

/// Projection of `user_roles?select=user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleRow {
    pub user_id: Uuid,
}
