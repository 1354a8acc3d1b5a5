pub mod error;
pub mod registry;
pub mod storage;

pub use error::BackendErrorBody;
pub use registry::{FirmwareRecord, NewFirmwareRecord, UserRoleRow, UserRow};
pub use storage::{Bucket, CreateBucketRequest, UploadResponse};
