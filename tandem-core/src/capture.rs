//! Capture adapter: permission check plus picker invocation.

use std::fmt;
use std::sync::Arc;

use tandem_contracts::prelude::{CameraError, CameraProvider};
use tandem_model::{CaptureOptions, CapturedImage, Platform};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("capture cancelled by user")]
    Cancelled,

    #[error("capture failed: {0}")]
    Failed(#[source] CameraError),
}

impl From<CameraError> for CaptureError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::Cancelled => CaptureError::Cancelled,
            other => CaptureError::Failed(other),
        }
    }
}

/// Obtains one image from the camera or gallery.
#[derive(Clone)]
pub struct CaptureAdapter {
    camera: Arc<dyn CameraProvider>,
    options: CaptureOptions,
}

impl fmt::Debug for CaptureAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureAdapter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CaptureAdapter {
    pub fn new(camera: Arc<dyn CameraProvider>, options: CaptureOptions) -> Self {
        Self { camera, options }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Request permission when the platform needs it, then show the picker.
    pub async fn capture(
        &self,
        platform: Platform,
    ) -> Result<CapturedImage, CaptureError> {
        if platform.requires_permission() {
            let state = self.camera.request_permissions().await?;
            if !state.allows_capture() {
                warn!(%platform, "camera permission declined");
                return Err(CaptureError::PermissionDenied);
            }
            debug!(?state, "camera permission resolved");
        }

        let image = self.camera.get_photo(platform, &self.options).await?;
        debug!(
            format = %image.format,
            source = %image.source,
            bytes = image.data_url.len(),
            "image captured"
        );
        Ok(image)
    }
}
