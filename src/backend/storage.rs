use async_trait::async_trait;
use firmware_schema::{Bucket, CreateBucketRequest, UploadResponse};
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use super::response::{expect_success, read_json};
use super::{ObjectStorage, SupabaseClient, UploadOptions};
use crate::error::BackendError;

impl SupabaseClient {
    pub fn build_list_buckets_request(&self) -> Result<reqwest::Request, BackendError> {
        let url = self.endpoint(["storage", "v1", "bucket"])?;
        Ok(self.request(Method::GET, url).build()?)
    }

    pub fn build_create_bucket_request(
        &self,
        body: &CreateBucketRequest,
    ) -> Result<reqwest::Request, BackendError> {
        let url = self.endpoint(["storage", "v1", "bucket"])?;
        Ok(self.request(Method::POST, url).json(body).build()?)
    }

    /// `path` may contain `/`; each part becomes its own URL segment.
    pub fn build_upload_request(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<reqwest::Request, BackendError> {
        let mut segments = vec!["storage", "v1", "object", bucket];
        segments.extend(path.split('/'));
        let url = self.endpoint(segments)?;

        Ok(self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, options.content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(bytes)
            .build()?)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError> {
        let resp = self.execute(self.build_list_buckets_request()?).await?;
        read_json(resp, "list buckets").await
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), BackendError> {
        let resp = self
            .execute(self.build_create_bucket_request(request)?)
            .await?;
        expect_success(resp, "create bucket").await
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadResponse, BackendError> {
        let resp = self
            .execute(self.build_upload_request(bucket, path, bytes, options)?)
            .await?;
        read_json(resp, "upload object").await
    }
}
