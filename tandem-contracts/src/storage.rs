use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("access denied: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),
}

/// Metadata returned after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub size: u64,
    pub content_type: String,
}

/// Network-backed object store addressed by slash-separated paths.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing object.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Resolve a durable, publicly fetchable URL for an existing object.
    async fn download_url(&self, path: &str) -> Result<String, StorageError>;
}
