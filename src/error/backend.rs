use reqwest::StatusCode;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BackendError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {message}")]
    UpstreamStatus {
        operation: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("{operation} returned an unexpected payload: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::UpstreamStatus { status, .. } => Some(*status),
            BackendError::Reqwest(e) => e.status(),
            _ => None,
        }
    }
}
