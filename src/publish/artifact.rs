use tracing::info;

use crate::backend::{ObjectStorage, UploadOptions};
use crate::config::ArtifactSettings;
use crate::error::{Phase, PublisherError};

/// Version without one leading `v`: `v2.3.0` becomes `2.3.0`.
pub fn version_tag(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// `<type>/<versionTag>_<fileName>`.
pub fn storage_path(firmware_type: &str, version: &str, file_name: &str) -> String {
    format!("{firmware_type}/{}_{file_name}", version_tag(version))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedArtifact {
    pub bucket: String,
    pub path: String,
    pub bytes_sent: usize,
    /// Object key echoed by the backend, when it sends one.
    pub key: Option<String>,
}

/// Reads the whole image into memory and upserts it at its deterministic path.
pub async fn upload_artifact(
    storage: &dyn ObjectStorage,
    artifact: &ArtifactSettings,
) -> Result<UploadedArtifact, PublisherError> {
    let content = tokio::fs::read(&artifact.file_path)
        .await
        .map_err(PublisherError::io(Phase::ArtifactUpload, &artifact.file_path))?;

    let path = storage_path(
        &artifact.firmware_type,
        &artifact.version,
        &artifact.file_name,
    );
    let bytes_sent = content.len();

    info!(
        bucket = %artifact.bucket,
        bytes = bytes_sent,
        "Uploading {} to {}...",
        artifact.file_name,
        path
    );

    let resp = storage
        .upload_object(&artifact.bucket, &path, content, UploadOptions::default())
        .await
        .map_err(PublisherError::backend(Phase::ArtifactUpload))?;

    Ok(UploadedArtifact {
        bucket: artifact.bucket.clone(),
        path,
        bytes_sent,
        key: resp.key,
    })
}
