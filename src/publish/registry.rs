use firmware_schema::{FirmwareRecord, NewFirmwareRecord};
use tracing::info;
use uuid::Uuid;

use crate::backend::RegistryStore;
use crate::config::ArtifactSettings;
use crate::error::{Phase, PublisherError};

/// `Himax Firmware v2.3.0` for type `himax`.
pub fn display_name(firmware_type: &str, version: &str) -> String {
    let mut chars = firmware_type.chars();
    let title: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{title} Firmware {version}")
}

pub fn build_record(
    artifact: &ArtifactSettings,
    location_path: &str,
    file_size_bytes: u64,
    modified_by: Uuid,
) -> NewFirmwareRecord {
    NewFirmwareRecord {
        name: display_name(&artifact.firmware_type, &artifact.version),
        version: artifact.version.clone(),
        r#type: artifact.firmware_type.clone(),
        location_path: location_path.to_string(),
        file_size_bytes,
        release_notes: artifact.release_notes.clone(),
        is_active: true,
        modified_by,
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub record: NewFirmwareRecord,
    /// Rows echoed back by the backend.
    pub inserted: Vec<FirmwareRecord>,
}

/// Inserts one registry row for the uploaded object. The size comes from the local file.
pub async fn register_firmware(
    registry: &dyn RegistryStore,
    artifact: &ArtifactSettings,
    location_path: &str,
    modified_by: Uuid,
) -> Result<Registration, PublisherError> {
    let file_size_bytes = tokio::fs::metadata(&artifact.file_path)
        .await
        .map_err(PublisherError::io(Phase::Registration, &artifact.file_path))?
        .len();

    info!(
        file_size_bytes,
        "Registering firmware version {} in database...", artifact.version
    );

    let record = build_record(artifact, location_path, file_size_bytes, modified_by);
    let inserted = registry
        .insert_firmware(&record)
        .await
        .map_err(PublisherError::backend(Phase::Registration))?;

    Ok(Registration { record, inserted })
}
