use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tandem_contracts::prelude::{CameraError, CameraProvider, PermissionState};
use tandem_model::{
    CaptureOptions, CaptureSource, CapturedImage, CropRegion, ImageFormat,
    Platform,
};
use tracing::debug;

use crate::data_url;
use crate::imaging::upload_format;

/// Picker stand-in that "selects" an image file from disk.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
    permission: PermissionState,
    crop: Option<CropRegion>,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            permission: PermissionState::Granted,
            crop: None,
        }
    }

    pub fn with_permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_crop(mut self, crop: Option<CropRegion>) -> Self {
        self.crop = crop;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content sniffing first, then the file extension.
    fn detect_format(&self, bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes)
            .ok()
            .and_then(upload_format)
            .or_else(|| {
                self.path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(|ext| ext.parse().ok())
            })
    }
}

#[async_trait]
impl CameraProvider for FileCamera {
    async fn request_permissions(&self) -> Result<PermissionState, CameraError> {
        Ok(self.permission)
    }

    async fn get_photo(
        &self,
        platform: Platform,
        options: &CaptureOptions,
    ) -> Result<CapturedImage, CameraError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CameraError::Unavailable(format!(
                    "{} does not exist",
                    self.path.display()
                ))
            } else {
                CameraError::Failed(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                ))
            }
        })?;

        let format = self.detect_format(&bytes).ok_or_else(|| {
            CameraError::Failed(format!(
                "{} is not a supported image",
                self.path.display()
            ))
        })?;

        // A file on disk is a gallery pick regardless of what was asked for.
        let source = match options.source {
            CaptureSource::Camera => CaptureSource::Camera,
            CaptureSource::Prompt | CaptureSource::Photos => CaptureSource::Photos,
        };
        debug!(
            path = %self.path.display(),
            %format,
            %source,
            quality = options.quality,
            "image read from disk"
        );

        let mut image =
            CapturedImage::new(data_url::encode(format.mime(), &bytes), format, platform)
                .with_source(source);
        if let Some(region) = self.crop {
            image = image.with_crop(region);
        }
        Ok(image)
    }
}
