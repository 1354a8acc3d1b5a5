//! In-memory backend recording every call, for phase tests.

use async_trait::async_trait;
use firmware_schema::{
    Bucket, CreateBucketRequest, FirmwareRecord, NewFirmwareRecord, UploadResponse, UserRoleRow,
    UserRow,
};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::backend::{ObjectStorage, RegistryStore, UploadOptions};
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListBuckets,
    CreateBucket(CreateBucketRequest),
    Upload {
        bucket: String,
        path: String,
        len: usize,
        content_type: String,
        upsert: bool,
    },
    UsersByEmail(String),
    RoleAssignments { role: String, scope: String },
    Insert(NewFirmwareRecord),
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub buckets: Mutex<Vec<String>>,
    pub users: Vec<Uuid>,
    pub roles: Vec<Uuid>,
    pub fail_list: bool,
    pub fail_create: bool,
    pub fail_upload: bool,
    pub fail_users: bool,
    pub fail_roles: bool,
    pub fail_insert: bool,
    pub calls: Mutex<Vec<Call>>,
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub rows: Mutex<Vec<NewFirmwareRecord>>,
}

impl FakeBackend {
    pub fn with_buckets(names: &[&str]) -> Self {
        Self {
            buckets: Mutex::new(names.iter().map(ToString::to_string).collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(operation: &'static str) -> BackendError {
        BackendError::UpstreamStatus {
            operation,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "fake failure".to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeBackend {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, BackendError> {
        self.record(Call::ListBuckets);
        if self.fail_list {
            return Err(Self::failure("list buckets"));
        }
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .iter()
            .map(|name| Bucket {
                id: name.clone(),
                name: name.clone(),
                public: true,
                created_at: None,
                extra: BTreeMap::new(),
            })
            .collect())
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<(), BackendError> {
        self.record(Call::CreateBucket(request.clone()));
        if self.fail_create {
            return Err(Self::failure("create bucket"));
        }
        self.buckets.lock().unwrap().push(request.name.clone());
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadResponse, BackendError> {
        self.record(Call::Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            len: bytes.len(),
            content_type: options.content_type.to_string(),
            upsert: options.upsert,
        });
        if self.fail_upload {
            return Err(Self::failure("upload object"));
        }
        let key = format!("{bucket}/{path}");
        self.objects.lock().unwrap().insert(key.clone(), bytes);
        Ok(UploadResponse {
            key: Some(key),
            id: None,
        })
    }
}

#[async_trait]
impl RegistryStore for FakeBackend {
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<UserRow>, BackendError> {
        self.record(Call::UsersByEmail(email.to_string()));
        if self.fail_users {
            return Err(Self::failure("query users"));
        }
        Ok(self.users.iter().map(|&id| UserRow { id }).collect())
    }

    async fn find_role_assignments(
        &self,
        role: &str,
        scope: &str,
    ) -> Result<Vec<UserRoleRow>, BackendError> {
        self.record(Call::RoleAssignments {
            role: role.to_string(),
            scope: scope.to_string(),
        });
        if self.fail_roles {
            return Err(Self::failure("query user_roles"));
        }
        Ok(self
            .roles
            .iter()
            .map(|&user_id| UserRoleRow { user_id })
            .collect())
    }

    async fn insert_firmware(
        &self,
        record: &NewFirmwareRecord,
    ) -> Result<Vec<FirmwareRecord>, BackendError> {
        self.record(Call::Insert(record.clone()));
        if self.fail_insert {
            return Err(Self::failure("insert firmware"));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push(record.clone());
        let columns = match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Ok(vec![FirmwareRecord {
            id: Some(serde_json::json!(rows.len())),
            columns,
        }])
    }
}
