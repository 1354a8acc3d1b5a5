use async_trait::async_trait;
use firmware_schema::{FirmwareRecord, NewFirmwareRecord, UserRoleRow, UserRow};
use reqwest::Method;

use super::response::{read_committed_rows, read_json};
use super::{RegistryStore, SupabaseClient};
use crate::error::BackendError;
use crate::utils::logging::with_pretty_json_debug;

const USERS_TABLE: &str = "users";
const USER_ROLES_TABLE: &str = "user_roles";
const FIRMWARE_TABLE: &str = "firmware";

/// PostgREST filter that excludes soft-deleted rows.
const NOT_DELETED: (&str, &str) = ("deleted_at", "is.null");

impl SupabaseClient {
    pub fn build_users_by_email_request(
        &self,
        email: &str,
    ) -> Result<reqwest::Request, BackendError> {
        let mut url = self.endpoint(["rest", "v1", USERS_TABLE])?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("email", &format!("eq.{email}"))
            .append_pair(NOT_DELETED.0, NOT_DELETED.1);
        Ok(self.request(Method::GET, url).build()?)
    }

    pub fn build_role_assignments_request(
        &self,
        role: &str,
        scope: &str,
    ) -> Result<reqwest::Request, BackendError> {
        let mut url = self.endpoint(["rest", "v1", USER_ROLES_TABLE])?;
        url.query_pairs_mut()
            .append_pair("select", "user_id")
            .append_pair("role", &format!("eq.{role}"))
            .append_pair("scope", &format!("eq.{scope}"))
            .append_pair(NOT_DELETED.0, NOT_DELETED.1);
        Ok(self.request(Method::GET, url).build()?)
    }

    pub fn build_insert_firmware_request(
        &self,
        record: &NewFirmwareRecord,
    ) -> Result<reqwest::Request, BackendError> {
        let url = self.endpoint(["rest", "v1", FIRMWARE_TABLE])?;
        Ok(self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(record)
            .build()?)
    }
}

#[async_trait]
impl RegistryStore for SupabaseClient {
    async fn find_users_by_email(&self, email: &str) -> Result<Vec<UserRow>, BackendError> {
        let resp = self
            .execute(self.build_users_by_email_request(email)?)
            .await?;
        read_json(resp, "query users").await
    }

    async fn find_role_assignments(
        &self,
        role: &str,
        scope: &str,
    ) -> Result<Vec<UserRoleRow>, BackendError> {
        let resp = self
            .execute(self.build_role_assignments_request(role, scope)?)
            .await?;
        read_json(resp, "query user_roles").await
    }

    async fn insert_firmware(
        &self,
        record: &NewFirmwareRecord,
    ) -> Result<Vec<FirmwareRecord>, BackendError> {
        with_pretty_json_debug(record, |body| {
            tracing::debug!(table = FIRMWARE_TABLE, body = %body, "Inserting registry row");
        });
        let resp = self
            .execute(self.build_insert_firmware_request(record)?)
            .await?;
        read_committed_rows(resp, "insert firmware").await
    }
}
