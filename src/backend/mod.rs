//! Backend collaborators: object storage and the relational registry.
//!
//! Phases only talk to the traits below. [`SupabaseClient`] implements both over the
//! Supabase Storage and PostgREST HTTP APIs.

mod client;
mod response;
mod rest;
mod storage;

pub use client::SupabaseClient;

use async_trait::async_trait;
use firmware_schema::{
    Bucket, CreateBucketRequest, FirmwareRecord, NewFirmwareRecord, UploadResponse, UserRoleRow,
    UserRow,
};

use crate::error::BackendError;

/// Content type of every uploaded firmware image.
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions<'a> {
    pub content_type: &'a str,
    /// Replace an existing object at the same path instead of failing.
    pub upsert: bool,
}

impl Default for UploadOptions<'_> {
    fn default() -> Self {
        Self {
            content_type: OCTET_STREAM,
            upsert: true,
        }
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError>;

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), BackendError>;

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadResponse, BackendError>;
}

#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Non-deleted `users` rows with this email.
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<UserRow>, BackendError>;

    /// Non-deleted `user_roles` rows with this role and scope.
    async fn find_role_assignments(
        &self,
        role: &str,
        scope: &str,
    ) -> Result<Vec<UserRoleRow>, BackendError>;

    /// Inserts one row into `firmware` and returns the stored representation.
    async fn insert_firmware(
        &self,
        record: &NewFirmwareRecord,
    ) -> Result<Vec<FirmwareRecord>, BackendError>;
}
