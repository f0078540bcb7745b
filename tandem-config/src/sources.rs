use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{non_empty_var, parse_bool_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub capture: FileCaptureConfig,
    #[serde(default)]
    pub notifications: FileNotificationConfig,
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub profile: FileProfileConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCaptureConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_editing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileNotificationConfig {
    /// Human-readable duration, e.g. `"1500ms"` or `"2s"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

/// Environment-derived configuration values.
///
/// Values are kept raw; parsing and its errors happen while composing.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub platform: Option<String>,
    pub capture_quality: Option<String>,
    pub capture_allow_editing: Option<bool>,
    pub capture_source: Option<String>,
    pub toast_duration: Option<String>,
    pub toast_position: Option<String>,
    pub storage_backend: Option<String>,
    pub storage_root: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub storage_endpoint: Option<String>,
    pub storage_bucket: Option<String>,
    pub storage_auth_token: Option<String>,
    pub profile_path: Option<PathBuf>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: non_empty_var("TANDEM_CONFIG_PATH").map(PathBuf::from),
            platform: non_empty_var("TANDEM_PLATFORM"),
            capture_quality: non_empty_var("TANDEM_CAPTURE_QUALITY"),
            capture_allow_editing: parse_bool_var("TANDEM_CAPTURE_ALLOW_EDITING"),
            capture_source: non_empty_var("TANDEM_CAPTURE_SOURCE"),
            toast_duration: non_empty_var("TANDEM_TOAST_DURATION"),
            toast_position: non_empty_var("TANDEM_TOAST_POSITION"),
            storage_backend: non_empty_var("TANDEM_STORAGE_BACKEND"),
            storage_root: non_empty_var("TANDEM_STORAGE_ROOT").map(PathBuf::from),
            public_base_url: non_empty_var("TANDEM_PUBLIC_BASE_URL"),
            storage_endpoint: non_empty_var("TANDEM_STORAGE_ENDPOINT"),
            storage_bucket: non_empty_var("TANDEM_STORAGE_BUCKET"),
            storage_auth_token: non_empty_var("TANDEM_STORAGE_AUTH_TOKEN"),
            profile_path: non_empty_var("TANDEM_PROFILE_PATH").map(PathBuf::from),
            dev_mode: parse_bool_var("TANDEM_DEV_MODE"),
        }
    }
}
