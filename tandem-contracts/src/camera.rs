use async_trait::async_trait;
use tandem_model::{CaptureOptions, CapturedImage, Platform};
use thiserror::Error;

/// Outcome of a runtime permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// Only a subset of photos is readable; capture may proceed
    Limited,
    Denied,
}

impl PermissionState {
    pub fn allows_capture(self) -> bool {
        !matches!(self, PermissionState::Denied)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("user cancelled the picker")]
    Cancelled,

    #[error("no camera or gallery available: {0}")]
    Unavailable(String),

    #[error("picker failed: {0}")]
    Failed(String),
}

/// Native or browser image picker.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Ask the OS for camera and photo-library access.
    async fn request_permissions(&self) -> Result<PermissionState, CameraError>;

    /// Show the picker and return the chosen image as a data-URL.
    async fn get_photo(
        &self,
        platform: Platform,
        options: &CaptureOptions,
    ) -> Result<CapturedImage, CameraError>;
}
