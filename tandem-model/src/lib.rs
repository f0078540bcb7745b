//! Core data model definitions shared across Tandem crates.
#![allow(missing_docs)]

pub mod capture;
pub mod error;
pub mod image;
pub mod profile;
pub mod toast;

// Intentionally curated re-exports for downstream consumers.
pub use capture::{CaptureOptions, CaptureSource, CropRegion, Platform};
pub use error::{ModelError, Result as ModelResult};
pub use image::{CapturedImage, ImageFormat, RawBinary, UploadResult};
pub use profile::{PhotoSlot, StudyLanguage, UserProfile};
pub use toast::{DEFAULT_TOAST_DURATION, Toast, ToastKind, ToastPosition};
