use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tandem_contracts::prelude::{ObjectStorage, StorageError, StoredObject};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use super::check_object_path;
use super::memory::{directory_url, public_url};

/// Objects written below a local directory and served from a public base URL
/// (a static file server or CDN pointed at the same directory).
#[derive(Clone, Debug)]
pub struct FsObjectStorage {
    root: PathBuf,
    base: Url,
}

impl FsObjectStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: &str,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            root: root.into(),
            base: directory_url(public_base_url)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, path: &str) -> Result<PathBuf, StorageError> {
        check_object_path(path)?;
        Ok(self.root.join(path))
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Transport(format!("failed to {action} {path:?}: {err}"))
}

async fn write_file(tmp: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = tokio::fs::File::create(tmp)
        .await
        .map_err(|err| io_error("create", tmp, err))?;
    file.write_all(bytes)
        .await
        .map_err(|err| io_error("write", tmp, err))?;
    file.flush()
        .await
        .map_err(|err| io_error("flush", tmp, err))
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    /// Tmp file + rename, so readers never see a half-written object.
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let target = self.path_for(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| io_error("create directory", parent, err))?;
        }

        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let tmp = target.with_extension(format!("tmp-{nanos}"));

        let written = match write_file(&tmp, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &target)
                .await
                .map_err(|err| io_error("move object into", &target, err)),
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            // Best effort; a leftover tmp file is never served.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }

        debug!(path, size = bytes.len(), "object written to disk");
        Ok(StoredObject {
            path: path.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        let target = self.path_for(path)?;
        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        public_url(&self.base, path)
    }
}
