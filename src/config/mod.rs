mod lax;
mod settings;

pub use settings::{
    ArtifactSettings, AttributionSettings, BackendSettings, PublisherSettings, SYSTEM_ROLE_SCOPE,
};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "publisher.toml";

/// Environment variable naming an alternative TOML file.
pub const CONFIG_FILE_ENV: &str = "PUBLISHER_CONFIG";

/// Environment variables read into [`Config`]. Keys are lower-cased, so `SUPABASE_URL`
/// lands in `supabase_url`. Values are always taken verbatim as strings.
pub const ENV_KEYS: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_SERVICE_ROLE_KEY",
    "FIRMWARE_PATH",
    "FIRMWARE_VERSION",
    "RELEASE_NOTES",
    "FIRMWARE_TYPE",
    "FIRMWARE_BUCKET",
    "FIRMWARE_BUCKET_PUBLIC",
    "SYSTEM_USER_EMAIL",
    "SYSTEM_USER_ROLE",
    "SYSTEM_USER_ID",
    "FALLBACK_USER_ID",
    "GITHUB_SHA",
    "HTTP_PROXY_URL",
    "ORPHAN_LOG_PATH",
    "LOG_LEVEL",
];

/// Raw publisher configuration managed by Figment.
///
/// Nothing here is validated; call [`Config::resolve`] to get [`PublisherSettings`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the Supabase project, e.g. `https://abc.supabase.co`. Required.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub supabase_url: Option<String>,

    /// Service-role key; bypasses RLS. Required.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub supabase_service_role_key: Option<String>,

    /// Local firmware image to publish. Required.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub firmware_path: Option<String>,

    /// Version label. Default: `commit-<short sha>`.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub firmware_version: Option<String>,

    /// Default: `Automated build from commit <sha>`.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub release_notes: Option<String>,

    /// Firmware category; first path segment of the object. Default: `himax`.
    #[serde(default = "default_firmware_type", deserialize_with = "lax::string")]
    pub firmware_type: String,

    /// Storage bucket. Default: `firmware`.
    #[serde(default = "default_bucket", deserialize_with = "lax::string")]
    pub firmware_bucket: String,

    /// Visibility used when the bucket has to be created. Default: `true`.
    #[serde(default = "default_bucket_public", deserialize_with = "lax::bool")]
    pub firmware_bucket_public: bool,

    #[serde(default, deserialize_with = "lax::opt_string")]
    pub system_user_email: Option<String>,

    /// Role looked up in `user_roles` (scope `system`). Default: `ww_admin`.
    #[serde(default = "default_system_user_role", deserialize_with = "lax::string")]
    pub system_user_role: String,

    /// Explicit attribution identifier; skips every lookup when set.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub system_user_id: Option<String>,

    /// Identifier used when every lookup misses. Default: the nil UUID.
    #[serde(default = "default_fallback_user_id", deserialize_with = "lax::string")]
    pub fallback_user_id: String,

    /// Commit hash used for default labels (set by GitHub Actions).
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub github_sha: Option<String>,

    /// Optional proxy for every backend request, e.g. `http://127.0.0.1:1080`.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub http_proxy_url: Option<String>,

    /// JSON-lines file receiving artifacts left unregistered by a failed run.
    #[serde(default, deserialize_with = "lax::opt_string")]
    pub orphan_log_path: Option<String>,

    /// Log level for the tracing subscriber when `RUST_LOG` is unset. Default: `info`.
    #[serde(default = "default_log_level", deserialize_with = "lax::string")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_service_role_key: None,
            firmware_path: None,
            firmware_version: None,
            release_notes: None,
            firmware_type: default_firmware_type(),
            firmware_bucket: default_bucket(),
            firmware_bucket_public: default_bucket_public(),
            system_user_email: None,
            system_user_role: default_system_user_role(),
            system_user_id: None,
            fallback_user_id: default_fallback_user_id(),
            github_sha: None,
            http_proxy_url: None,
            orphan_log_path: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Builds a Figment that merges defaults, an optional TOML file and the environment.
    ///
    /// The TOML file is `$PUBLISHER_CONFIG` when set, else `publisher.toml` in the working
    /// directory if it exists.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = match config_file() {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        };
        figment.merge(Serialized::globals(env_strings()))
    }

    /// Extracts the configuration without validating it.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from) {
            if !path.is_file() {
                return Err(ConfigError::Invalid {
                    key: CONFIG_FILE_ENV,
                    message: format!("config file not found: {}", path.display()),
                });
            }
        }
        Ok(Self::figment().extract()?)
    }
}

fn config_file() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_FILE_ENV) {
        Some(path) => Some(PathBuf::from(path)),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    }
}

/// Whitelisted env vars as plain strings. Figment's `Env` provider would parse `1.10` as a
/// float and `0001234` as an integer.
fn env_strings() -> BTreeMap<String, String> {
    ENV_KEYS
        .iter()
        .filter_map(|key| {
            std::env::var(key)
                .ok()
                .map(|value| (key.to_ascii_lowercase(), value))
        })
        .collect()
}

fn default_firmware_type() -> String {
    "himax".to_string()
}

fn default_bucket() -> String {
    "firmware".to_string()
}

fn default_bucket_public() -> bool {
    true
}

fn default_system_user_role() -> String {
    "ww_admin".to_string()
}

fn default_fallback_user_id() -> String {
    uuid::Uuid::nil().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
