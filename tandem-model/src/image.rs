//! Transient image values passed between capture, conversion and upload.

use std::fmt;
use std::str::FromStr;

use crate::capture::{CaptureSource, CropRegion, Platform};
use crate::error::ModelError;

/// Encoded image formats the picker can hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// File extension used in storage paths (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, ModelError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Ok(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
            "image/gif" => Ok(ImageFormat::Gif),
            "image/webp" => Ok(ImageFormat::Webp),
            other => Err(ModelError::UnknownImageFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "gif" => Ok(ImageFormat::Gif),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(ModelError::UnknownImageFormat(other.to_string())),
        }
    }
}

/// An image as returned by the picker: still text-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
    pub format: ImageFormat,
    pub source: CaptureSource,
    pub platform: Platform,
    /// Region chosen in an in-app cropper, applied before upload
    pub crop: Option<CropRegion>,
}

impl CapturedImage {
    pub fn new(
        data_url: impl Into<String>,
        format: ImageFormat,
        platform: Platform,
    ) -> Self {
        Self {
            data_url: data_url.into(),
            format,
            source: CaptureSource::Prompt,
            platform,
            crop: None,
        }
    }

    pub fn with_source(mut self, source: CaptureSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop = Some(crop);
        self
    }
}

// Data-URLs run to megabytes; keep them out of logs.
impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("data_url_len", &self.data_url.len())
            .field("format", &self.format)
            .field("source", &self.source)
            .field("platform", &self.platform)
            .field("crop", &self.crop)
            .finish()
    }
}

/// Decoded image bytes ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct RawBinary {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl RawBinary {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for RawBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBinary")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UploadResult {
    /// Durable, publicly resolvable URL
    pub url: String,
    /// Storage path the object was written to
    pub path: String,
}
