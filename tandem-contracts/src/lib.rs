//! Trait surfaces for the external services an editing session talks to.
//!
//! Every collaborator is object safe and `Send + Sync` so it can be shared
//! behind an `Arc<dyn ...>` between the session and the UI layer.

pub mod camera;
pub mod notify;
pub mod profile;
pub mod storage;

/// Frequently used collaborator traits and their error types.
pub mod prelude {
    pub use super::camera::{CameraError, CameraProvider, PermissionState};
    pub use super::notify::Notifier;
    pub use super::profile::{ProfileService, ProfileServiceError, ProfileStream};
    pub use super::storage::{ObjectStorage, StorageError, StoredObject};
}
