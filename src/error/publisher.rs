use std::fmt;
use std::path::PathBuf;
use thiserror::Error as ThisError;

use super::{BackendError, ConfigError};

/// Step of a publish run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    BucketEnsure,
    ArtifactUpload,
    Registration,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configuration => "configuration",
            Phase::BucketEnsure => "bucket ensure",
            Phase::ArtifactUpload => "artifact upload",
            Phase::Registration => "metadata registration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, ThisError)]
pub enum PublisherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{phase} failed: {source}")]
    Backend {
        phase: Phase,
        #[source]
        source: BackendError,
    },

    #[error("{phase} failed on {}: {source}", path.display())]
    Io {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublisherError {
    pub(crate) fn backend(phase: Phase) -> impl FnOnce(BackendError) -> Self {
        move |source| PublisherError::Backend { phase, source }
    }

    pub(crate) fn io(phase: Phase, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PublisherError::Io {
            phase,
            path,
            source,
        }
    }

    /// Phase that produced the error.
    pub fn phase(&self) -> Phase {
        match self {
            PublisherError::Config(_) => Phase::Configuration,
            PublisherError::Backend { phase, .. } | PublisherError::Io { phase, .. } => *phase,
        }
    }

    /// HTTP status returned by the backend, when the failure carried one.
    pub fn upstream_status(&self) -> Option<reqwest::StatusCode> {
        match self {
            PublisherError::Backend { source, .. } => source.status(),
            _ => None,
        }
    }
}
