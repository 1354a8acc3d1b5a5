use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;
use uuid::Uuid;

use super::Config;
use crate::error::ConfigError;

/// Scope a role assignment must carry for the role lookup.
pub const SYSTEM_ROLE_SCOPE: &str = "system";

const SHORT_SHA_LEN: usize = 7;
const UNKNOWN_COMMIT: &str = "unknown";

/// Validated settings for one publish run. Built once by [`Config::resolve`] and passed
/// by reference to every phase.
#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub backend: BackendSettings,
    pub artifact: ArtifactSettings,
    pub attribution: AttributionSettings,
    pub orphan_log_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct BackendSettings {
    /// Project base URL, always ending in `/`.
    pub url: Url,
    pub service_key: String,
    pub proxy: Option<Url>,
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("url", &self.url.as_str())
            .field("service_key", &"<redacted>")
            .field("proxy", &self.proxy.as_ref().map(Url::as_str))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    pub file_path: PathBuf,
    /// Base name of `file_path`.
    pub file_name: String,
    pub firmware_type: String,
    pub version: String,
    pub release_notes: String,
    pub bucket: String,
    pub bucket_public: bool,
}

#[derive(Debug, Clone)]
pub struct AttributionSettings {
    pub explicit_id: Option<Uuid>,
    pub email: Option<String>,
    pub role: String,
    pub fallback_id: Uuid,
}

impl Config {
    /// Validates every input and derives the defaults that depend on other inputs.
    ///
    /// All missing required keys are reported together.
    pub fn resolve(&self) -> Result<PublisherSettings, ConfigError> {
        let url = present(self.supabase_url.as_deref());
        let key = present(self.supabase_service_role_key.as_deref());
        let path = present(self.firmware_path.as_deref());

        let missing: Vec<&'static str> = [
            ("SUPABASE_URL", url.is_none()),
            ("SUPABASE_SERVICE_ROLE_KEY", key.is_none()),
            ("FIRMWARE_PATH", path.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(url), Some(key), Some(path)) = (url, key, path) else {
            return Err(ConfigError::Missing(missing));
        };

        let backend = BackendSettings {
            url: parse_base_url("SUPABASE_URL", url)?,
            service_key: key.to_string(),
            proxy: self
                .http_proxy_url
                .as_deref()
                .map(|raw| parse_http_url("HTTP_PROXY_URL", raw.trim()))
                .transpose()?,
        };

        let file_path = PathBuf::from(path);
        let file_name = base_name(&file_path).ok_or_else(|| ConfigError::Invalid {
            key: "FIRMWARE_PATH",
            message: format!("{path:?} does not name a file"),
        })?;

        let firmware_type = non_blank("FIRMWARE_TYPE", &self.firmware_type)?;
        if firmware_type.contains('/') {
            return Err(ConfigError::Invalid {
                key: "FIRMWARE_TYPE",
                message: format!("{firmware_type:?} must be a single path segment"),
            });
        }

        let artifact = ArtifactSettings {
            file_path,
            file_name,
            firmware_type,
            version: self
                .firmware_version
                .clone()
                .unwrap_or_else(|| default_version(self.github_sha.as_deref())),
            release_notes: self
                .release_notes
                .clone()
                .unwrap_or_else(|| default_release_notes(self.github_sha.as_deref())),
            bucket: non_blank("FIRMWARE_BUCKET", &self.firmware_bucket)?,
            bucket_public: self.firmware_bucket_public,
        };

        let attribution = AttributionSettings {
            explicit_id: self
                .system_user_id
                .as_deref()
                .map(|raw| parse_uuid("SYSTEM_USER_ID", raw))
                .transpose()?,
            email: self.system_user_email.as_deref().map(|e| e.trim().to_string()),
            role: non_blank("SYSTEM_USER_ROLE", &self.system_user_role)?,
            fallback_id: parse_uuid("FALLBACK_USER_ID", &self.fallback_user_id)?,
        };

        Ok(PublisherSettings {
            backend,
            artifact,
            attribution,
            orphan_log_path: self.orphan_log_path.as_deref().map(PathBuf::from),
        })
    }
}

/// `commit-<first 7 chars of sha>`.
pub(crate) fn default_version(github_sha: Option<&str>) -> String {
    let short: String = github_sha
        .unwrap_or(UNKNOWN_COMMIT)
        .chars()
        .take(SHORT_SHA_LEN)
        .collect();
    format!("commit-{short}")
}

pub(crate) fn default_release_notes(github_sha: Option<&str>) -> String {
    format!(
        "Automated build from commit {}",
        github_sha.unwrap_or(UNKNOWN_COMMIT)
    )
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

fn non_blank(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Invalid {
            key,
            message: "must not be blank".to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key,
        message: format!("{raw:?}: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            key,
            message: format!("{raw:?} is not an http(s) URL"),
        });
    }
    Ok(url)
}

/// Drops query/fragment and guarantees a trailing `/` so endpoint joins keep any path prefix.
fn parse_base_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = parse_http_url(key, raw)?;
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_uuid(key: &'static str, raw: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        message: format!("{raw:?} is not a UUID: {e}"),
    })
}
