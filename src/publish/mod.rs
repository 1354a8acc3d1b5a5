//! The three publish phases and the run that chains them.
//!
//! Each phase needs the previous one to succeed. Side effects of finished phases are kept when a
//! later phase fails; an uploaded object without a registry row is reported by [`orphan`].

pub mod artifact;
pub mod attribution;
pub mod bucket;
pub mod orphan;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use artifact::{UploadedArtifact, storage_path, upload_artifact, version_tag};
pub use attribution::{Attribution, AttributionSource, resolve_attribution};
pub use bucket::{BucketOutcome, ensure_bucket};
pub use orphan::{OrphanedArtifact, record_orphan};
pub use registry::{Registration, build_record, display_name, register_firmware};

use tracing::info;

use crate::backend::{ObjectStorage, RegistryStore, SupabaseClient};
use crate::config::PublisherSettings;
use crate::error::{Phase, PublisherError};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub bucket_outcome: BucketOutcome,
    pub artifact: UploadedArtifact,
    pub attribution: Attribution,
    pub registration: Registration,
}

pub struct Publisher<'a> {
    settings: &'a PublisherSettings,
    storage: &'a dyn ObjectStorage,
    registry: &'a dyn RegistryStore,
}

impl<'a> Publisher<'a> {
    pub fn new(
        settings: &'a PublisherSettings,
        storage: &'a dyn ObjectStorage,
        registry: &'a dyn RegistryStore,
    ) -> Self {
        Self {
            settings,
            storage,
            registry,
        }
    }

    /// Bucket ensure, artifact upload, then metadata registration.
    pub async fn run(&self) -> Result<PublishReport, PublisherError> {
        let artifact = &self.settings.artifact;

        let bucket_outcome = ensure_bucket(self.storage, &artifact.bucket, artifact.bucket_public)
            .await
            .map_err(PublisherError::backend(Phase::BucketEnsure))?;

        let uploaded = upload_artifact(self.storage, artifact).await?;
        info!(
            bucket = %uploaded.bucket,
            path = %uploaded.path,
            bytes = uploaded.bytes_sent,
            "Artifact uploaded"
        );

        let attribution = resolve_attribution(&self.settings.attribution, self.registry).await;

        let registration =
            match register_firmware(self.registry, artifact, &uploaded.path, attribution.user_id)
                .await
            {
                Ok(registration) => registration,
                Err(e) => {
                    let orphan = OrphanedArtifact::new(
                        uploaded.bucket.as_str(),
                        uploaded.path.as_str(),
                        artifact.version.as_str(),
                        &e,
                    );
                    record_orphan(self.settings.orphan_log_path.as_deref(), &orphan).await;
                    return Err(e);
                }
            };

        Ok(PublishReport {
            bucket_outcome,
            artifact: uploaded,
            attribution,
            registration,
        })
    }
}

/// Runs every phase against the Supabase project named in `settings`.
pub async fn publish(settings: &PublisherSettings) -> Result<PublishReport, PublisherError> {
    let client = SupabaseClient::new(&settings.backend)
        .map_err(PublisherError::backend(Phase::Configuration))?;
    Publisher::new(settings, &client, &client).run().await
}
