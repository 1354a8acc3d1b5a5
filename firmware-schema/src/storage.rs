//! Supabase Storage API schema (`/storage/v1`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of the `GET /storage/v1/bucket` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub public: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Columns we do not model (`owner`, `file_size_limit`, `allowed_mime_types`, ...).
    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Body of `POST /storage/v1/bucket`.
///
/// Storage uses `id` as the bucket's address and `name` for display; both are set to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketRequest {
    pub id: String,
    pub name: String,
    pub public: bool,
}

impl CreateBucketRequest {
    pub fn new(name: impl Into<String>, public: bool) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            public,
        }
    }
}

/// Response of `POST /storage/v1/object/{bucket}/{path}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Full object key, `<bucket>/<path>`.
    #[serde(rename = "Key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
