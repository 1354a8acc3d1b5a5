use firmware_schema::BackendErrorBody;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::BackendError;
use crate::utils::logging::body_preview;

/// Reads the body and decodes it as `T`, or turns a non-success status into an error.
pub(super) async fn read_json<T>(
    resp: reqwest::Response,
    operation: &'static str,
) -> Result<T, BackendError>
where
    T: DeserializeOwned,
{
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        return Err(status_error(operation, status, &bytes));
    }

    serde_json::from_slice(&bytes).map_err(|source| {
        tracing::debug!(
            operation,
            %status,
            body = %body_preview(&bytes),
            "Backend payload did not match schema"
        );
        BackendError::Decode { operation, source }
    })
}

/// For writes that are committed once the status is a success: an echo body that cannot be
/// read or decoded is logged and dropped instead of failing the call.
pub(super) async fn read_committed_rows<T>(
    resp: reqwest::Response,
    operation: &'static str,
) -> Result<Vec<T>, BackendError>
where
    T: DeserializeOwned,
{
    let status = resp.status();
    if !status.is_success() {
        let bytes = resp.bytes().await?;
        return Err(status_error(operation, status, &bytes));
    }

    match resp.bytes().await {
        Ok(bytes) => Ok(decode_echo(operation, &bytes)),
        Err(e) => {
            tracing::warn!(operation, %status, error = %e, "Could not read echoed rows");
            Ok(Vec::new())
        }
    }
}

fn decode_echo<T>(operation: &'static str, bytes: &[u8]) -> Vec<T>
where
    T: DeserializeOwned,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::warn!(
            operation,
            error = %e,
            body = %body_preview(bytes),
            "Echoed rows did not match schema; keeping the committed write"
        );
        Vec::new()
    })
}

/// Discards a success body; a non-success status becomes an error.
pub(super) async fn expect_success(
    resp: reqwest::Response,
    operation: &'static str,
) -> Result<(), BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let bytes = resp.bytes().await?;
    Err(status_error(operation, status, &bytes))
}

fn status_error(operation: &'static str, status: StatusCode, bytes: &[u8]) -> BackendError {
    let preview = body_preview(bytes);

    tracing::debug!(
        operation,
        %status,
        body = %preview,
        "Backend returned error status"
    );

    let message = serde_json::from_slice::<BackendErrorBody>(bytes)
        .ok()
        .and_then(|body| body.summary())
        .or_else(|| Some(preview).filter(|p| !p.trim().is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        });

    BackendError::UpstreamStatus {
        operation,
        status,
        message,
    }
}
