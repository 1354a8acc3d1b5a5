//! Ledger of objects uploaded by a run whose registry insert then failed.
//!
//! Upload and insert are separate requests, so nothing rolls the object back. The ledger makes
//! the leftover visible: always as an error log line, and as a JSON line in the configured file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedArtifact {
    pub bucket: String,
    pub path: String,
    pub version: String,
    pub error: String,
    pub recorded_at: DateTime<Utc>,
}

impl OrphanedArtifact {
    pub fn new(
        bucket: impl Into<String>,
        path: impl Into<String>,
        version: impl Into<String>,
        error: &impl ToString,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            version: version.into(),
            error: error.to_string(),
            recorded_at: Utc::now(),
        }
    }
}

/// Reports `entry`; appends it to `ledger` when one is configured. Ledger write failures are
/// logged and swallowed.
pub async fn record_orphan(ledger: Option<&Path>, entry: &OrphanedArtifact) {
    error!(
        bucket = %entry.bucket,
        path = %entry.path,
        version = %entry.version,
        "Artifact was uploaded but not registered; the object remains in storage"
    );

    let Some(ledger) = ledger else {
        return;
    };

    match append_line(ledger, entry).await {
        Ok(()) => info!(ledger = %ledger.display(), "Orphaned artifact recorded"),
        Err(e) => warn!(
            ledger = %ledger.display(),
            error = %e,
            "Failed to record orphaned artifact"
        ),
    }
}

async fn append_line(ledger: &Path, entry: &OrphanedArtifact) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(ledger)
        .await?;
    file.write_all(&line).await?;
    file.flush().await
}
