use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::Lazy;
use tracing::debug;

use super::error::ConfigLoadError;
use super::models::{
    CaptureConfig, Config, ConfigMetadata, NotificationConfig, ProfileConfig,
    StorageBackend, StorageConfig,
};
use super::sources::{EnvConfig, FileConfig};
use super::validation::{self, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("tandem.toml"),
        PathBuf::from("config/tandem.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;
        debug!(path = %path.display(), ?provenance, "configuration file loaded");

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if metadata.config_path.is_none() {
        warnings.push_with_hint(
            "No tandem.toml detected; falling back to environment variables",
            "Create tandem.toml or set TANDEM_CONFIG_PATH",
        );
    }

    let FileConfig {
        capture: file_capture,
        notifications: file_notifications,
        storage: file_storage,
        profile: file_profile,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let defaults = CaptureConfig::default();
    let capture = CaptureConfig {
        platform: parse_layer(
            "TANDEM_PLATFORM",
            env.platform,
            file_capture.platform,
        )?
        .unwrap_or(defaults.platform),
        quality: parse_layer(
            "TANDEM_CAPTURE_QUALITY",
            env.capture_quality,
            None::<String>,
        )?
        .or(file_capture.quality)
        .unwrap_or(defaults.quality),
        allow_editing: env
            .capture_allow_editing
            .or(file_capture.allow_editing)
            .unwrap_or(defaults.allow_editing),
        source: parse_layer(
            "TANDEM_CAPTURE_SOURCE",
            env.capture_source,
            file_capture.source,
        )?
        .unwrap_or(defaults.source),
    };

    let defaults = NotificationConfig::default();
    let notifications = NotificationConfig {
        duration: match env.toast_duration.or(file_notifications.duration) {
            Some(raw) => humantime::parse_duration(&raw).map_err(|err| {
                ConfigLoadError::InvalidValue {
                    key: "TANDEM_TOAST_DURATION",
                    value: raw.clone(),
                    reason: err.to_string(),
                }
            })?,
            None => defaults.duration,
        },
        position: parse_layer(
            "TANDEM_TOAST_POSITION",
            env.toast_position,
            file_notifications.position,
        )?
        .unwrap_or(defaults.position),
    };

    let defaults = StorageConfig::default();
    let storage = StorageConfig {
        backend: parse_layer::<StorageBackend, _>(
            "TANDEM_STORAGE_BACKEND",
            env.storage_backend,
            file_storage.backend,
        )?
        .unwrap_or(defaults.backend),
        root: env
            .storage_root
            .or(file_storage.root)
            .unwrap_or(defaults.root),
        public_base_url: env
            .public_base_url
            .or(file_storage.public_base_url)
            .unwrap_or(defaults.public_base_url),
        endpoint: env
            .storage_endpoint
            .or(file_storage.endpoint)
            .unwrap_or(defaults.endpoint),
        bucket: env.storage_bucket.or(file_storage.bucket),
        auth_token: env.storage_auth_token.or(file_storage.auth_token),
    };

    let profile = ProfileConfig {
        store_path: env
            .profile_path
            .or(file_profile.store_path)
            .unwrap_or_else(|| ProfileConfig::default().store_path),
    };

    let config = Config {
        capture,
        notifications,
        storage,
        profile,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata,
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    Ok((config, warnings))
}

/// Parse the environment value if present, else the file value.
fn parse_layer<T, E>(
    key: &'static str,
    env: Option<String>,
    file: Option<String>,
) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr<Err = E>,
    E: Display,
{
    let Some(raw) = env.or(file) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|err| ConfigLoadError::InvalidValue {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        })
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
