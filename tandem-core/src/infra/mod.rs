//! Concrete collaborators for the contracts in `tandem-contracts`.

pub mod file_camera;
pub mod fs_storage;
pub mod json_profile;
pub mod memory;
pub mod notifier;
pub mod rest_storage;

pub use file_camera::FileCamera;
pub use fs_storage::FsObjectStorage;
pub use json_profile::JsonFileProfileService;
pub use memory::{
    InMemoryProfileService, MemoryObjectStorage, ProfileUpdate, ProfileWrite,
};
pub use notifier::{ChannelNotifier, LogNotifier};
pub use rest_storage::RestObjectStorage;

use tandem_contracts::prelude::StorageError;

/// Reject object paths that could escape a storage root or base URL.
pub(crate) fn check_object_path(path: &str) -> Result<(), StorageError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
