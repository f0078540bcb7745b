use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tandem_model::{
    CaptureOptions, CaptureSource, DEFAULT_TOAST_DURATION, Platform,
    ToastPosition,
};

pub const DEFAULT_STORAGE_ROOT: &str = "./media";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/media/";
pub const DEFAULT_REST_ENDPOINT: &str = "https://firebasestorage.googleapis.com";
pub const DEFAULT_PROFILE_PATH: &str = "./profile.json";

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub capture: CaptureConfig,
    pub notifications: NotificationConfig,
    pub storage: StorageConfig,
    pub profile: ProfileConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub platform: Platform,
    pub quality: u8,
    pub allow_editing: bool,
    pub source: CaptureSource,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let options = CaptureOptions::default();
        Self {
            platform: Platform::default(),
            quality: options.quality,
            allow_editing: options.allow_editing,
            source: options.source,
        }
    }
}

impl CaptureConfig {
    pub fn options(&self) -> CaptureOptions {
        CaptureOptions {
            quality: self.quality,
            allow_editing: self.allow_editing,
            source: self.source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub duration: Duration,
    pub position: ToastPosition,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_TOAST_DURATION,
            position: ToastPosition::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Filesystem,
    Rest,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Filesystem => write!(f, "filesystem"),
            StorageBackend::Rest => write!(f, "rest"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "filesystem" | "fs" | "file" => Ok(StorageBackend::Filesystem),
            "rest" | "http" | "firebase" => Ok(StorageBackend::Rest),
            other => Err(format!(
                "unknown storage backend '{other}' (expected memory, filesystem or rest)"
            )),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the filesystem backend
    pub root: PathBuf,
    /// Base that object paths are joined onto (memory and filesystem)
    pub public_base_url: String,
    /// REST endpoint origin
    pub endpoint: String,
    pub bucket: Option<String>,
    pub auth_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            endpoint: DEFAULT_REST_ENDPOINT.to_string(),
            bucket: None,
            auth_token: None,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("root", &self.root)
            .field("public_base_url", &self.public_base_url)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub store_path: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_PROFILE_PATH),
        }
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
