//! Capture request parameters shared by the camera collaborators.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Execution environment the capture runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Platform {
    /// Native shell; runtime permissions must be requested first
    #[default]
    Native,
    /// Browser; the picker handles permissions itself
    Web,
}

impl Platform {
    pub fn requires_permission(self) -> bool {
        matches!(self, Platform::Native)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Native => write!(f, "native"),
            Platform::Web => write!(f, "web"),
        }
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "android" | "ios" => Ok(Platform::Native),
            "web" => Ok(Platform::Web),
            other => Err(ModelError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Where the picker takes the image from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CaptureSource {
    /// Let the user choose between camera and gallery
    #[default]
    Prompt,
    Camera,
    Photos,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Prompt => write!(f, "prompt"),
            CaptureSource::Camera => write!(f, "camera"),
            CaptureSource::Photos => write!(f, "photos"),
        }
    }
}

impl FromStr for CaptureSource {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" => Ok(CaptureSource::Prompt),
            "camera" => Ok(CaptureSource::Camera),
            "photos" | "gallery" => Ok(CaptureSource::Photos),
            other => Err(ModelError::UnknownCaptureSource(other.to_string())),
        }
    }
}

/// Options handed to the image picker.
///
/// The picker always returns a data-URL; there is no file-path result mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaptureOptions {
    /// JPEG quality hint, 1..=100
    pub quality: u8,
    /// Let the OS picker offer its own edit/crop step when it has one
    pub allow_editing: bool,
    pub source: CaptureSource,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 100,
            allow_editing: true,
            source: CaptureSource::Prompt,
        }
    }
}

/// Rectangle selected by the user in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, ModelError> {
        if width == 0 || height == 0 {
            return Err(ModelError::InvalidCropRegion(format!(
                "{width}x{height} has no area"
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Parses `x,y,width,height`.
impl FromStr for CropRegion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ModelError::InvalidCropRegion(format!("{s}: {err}")))?;

        match parts.as_slice() {
            [x, y, width, height] => Self::new(*x, *y, *width, *height),
            _ => Err(ModelError::InvalidCropRegion(format!(
                "{s}: expected x,y,width,height"
            ))),
        }
    }
}
