use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownImageFormat(String),
    InvalidCropRegion(String),
    UnknownPlatform(String),
    UnknownCaptureSource(String),
    UnknownToastPosition(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownImageFormat(raw) => {
                write!(f, "unknown image format: {raw}")
            }
            ModelError::InvalidCropRegion(msg) => {
                write!(f, "invalid crop region: {msg}")
            }
            ModelError::UnknownPlatform(raw) => {
                write!(f, "unknown platform: {raw}")
            }
            ModelError::UnknownCaptureSource(raw) => {
                write!(f, "unknown capture source: {raw}")
            }
            ModelError::UnknownToastPosition(raw) => {
                write!(f, "unknown toast position: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
