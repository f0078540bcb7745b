//! Upload coordinator: write the image, then resolve its durable URL.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tandem_contracts::prelude::{ObjectStorage, StorageError};
use tandem_model::{ImageFormat, UploadResult};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("owner id {0:?} cannot be used as a storage path segment")]
    InvalidOwner(String),

    #[error("writing {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("resolving URL for {path} failed: {source}")]
    Retrieval {
        path: String,
        #[source]
        source: StorageError,
    },
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Storage path for a user's upload: `users/<owner>/<millis>.<ext>`.
///
/// Two uploads by the same owner within one millisecond collide.
pub fn storage_path(
    owner_id: &str,
    timestamp_millis: i64,
    format: ImageFormat,
) -> Result<String, UploadError> {
    let owner = owner_id.trim();
    if owner.is_empty()
        || owner.contains('/')
        || owner == "."
        || owner == ".."
    {
        return Err(UploadError::InvalidOwner(owner_id.to_string()));
    }
    Ok(format!(
        "users/{owner}/{timestamp_millis}.{}",
        format.extension()
    ))
}

/// Persists image bytes to object storage on behalf of a user.
#[derive(Clone)]
pub struct UploadCoordinator {
    storage: Arc<dyn ObjectStorage>,
    clock: Clock,
}

impl fmt::Debug for UploadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCoordinator").finish_non_exhaustive()
    }
}

impl UploadCoordinator {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replace the wall clock used for path timestamps.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        format: ImageFormat,
        owner_id: &str,
    ) -> Result<UploadResult, UploadError> {
        let path = storage_path(owner_id, (self.clock)(), format)?;
        let size = bytes.len();

        let stored = self
            .storage
            .put_object(&path, bytes, format.mime())
            .await
            .map_err(|source| UploadError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(path = %stored.path, size, "object written");

        let url = self.storage.download_url(&path).await.map_err(|source| {
            UploadError::Retrieval {
                path: path.clone(),
                source,
            }
        })?;
        info!(%path, %url, "upload complete");

        Ok(UploadResult { url, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_layout() {
        assert_eq!(
            storage_path("abc", 1_700_000_000_123, ImageFormat::Jpeg).unwrap(),
            "users/abc/1700000000123.jpeg"
        );
    }

    #[test]
    fn path_rejects_traversal_owners() {
        for owner in ["", "  ", "a/b", "..", "."] {
            assert!(
                matches!(
                    storage_path(owner, 1, ImageFormat::Png),
                    Err(UploadError::InvalidOwner(_))
                ),
                "{owner:?} accepted"
            );
        }
    }
}
