//! Configuration for Tandem drivers.
//!
//! Values are layered `.env` -> process environment -> TOML file ->
//! defaults, with environment variables taking precedence over the file.
#![allow(missing_docs)]

pub mod error;
pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    CaptureConfig, Config, ConfigMetadata, NotificationConfig, ProfileConfig,
    StorageBackend, StorageConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
