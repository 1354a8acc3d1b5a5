use firmware_schema::CreateBucketRequest;
use tracing::{debug, info};

use crate::backend::ObjectStorage;
use crate::error::BackendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    Existing,
    Created,
}

/// Creates `name` with the given visibility unless a bucket of that name is already listed.
pub async fn ensure_bucket(
    storage: &dyn ObjectStorage,
    name: &str,
    public: bool,
) -> Result<BucketOutcome, BackendError> {
    let buckets = storage.list_buckets().await?;

    if buckets.iter().any(|bucket| bucket.name == name) {
        debug!(bucket = name, "Bucket already exists");
        return Ok(BucketOutcome::Existing);
    }

    info!(bucket = name, public, "Creating bucket: {name}");
    storage
        .create_bucket(&CreateBucketRequest::new(name, public))
        .await?;
    Ok(BucketOutcome::Created)
}
