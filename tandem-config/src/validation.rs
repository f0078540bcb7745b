use thiserror::Error;
use url::Url;

use super::models::{Config, StorageBackend};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("capture quality {quality} is outside 1..=100")]
    QualityOutOfRange { quality: u8 },
    #[error("storage backend 'rest' requires a bucket")]
    MissingBucket,
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let quality = config.capture.quality;
    if !(1..=100).contains(&quality) {
        return Err(ConfigGuardRailError::QualityOutOfRange { quality });
    }

    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Rest => {
            if storage.bucket.as_deref().is_none_or(|b| b.trim().is_empty()) {
                return Err(ConfigGuardRailError::MissingBucket);
            }
            check_url("storage.endpoint", &storage.endpoint)?;
            if storage.auth_token.is_none() {
                warnings.push_with_hint(
                    "REST storage configured without an auth token; uploads must be publicly writable",
                    "Set TANDEM_STORAGE_AUTH_TOKEN or storage.auth_token",
                );
            }
        }
        StorageBackend::Filesystem => {
            check_url("storage.public_base_url", &storage.public_base_url)?;
            if !storage.root.exists() {
                warnings.push(format!(
                    "storage root {} does not exist yet; it will be created on first upload",
                    storage.root.display()
                ));
            }
        }
        StorageBackend::Memory => {
            check_url("storage.public_base_url", &storage.public_base_url)?;
            if !config.dev_mode {
                warnings.push_with_hint(
                    "In-memory storage keeps uploads only for the life of the process",
                    "Use storage.backend = \"filesystem\" or \"rest\" outside dev mode",
                );
            }
        }
    }

    if config.notifications.duration.is_zero() {
        warnings.push("toast duration is zero; notifications will not be visible");
    }

    Ok(warnings)
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigGuardRailError> {
    Url::parse(value).map(|_| ()).map_err(|err| {
        ConfigGuardRailError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: err.to_string(),
        }
    })
}
