use tandem_contracts::prelude::{ProfileServiceError, StorageError};
use thiserror::Error;

use crate::capture::CaptureError;
use crate::data_url::EncodingError;
use crate::imaging::CropError;
use crate::session::{EditPhase, OperationKind};
use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("another profile operation is already running: {running}")]
    Busy { running: OperationKind },

    #[error("profile has not been loaded yet")]
    ProfileNotLoaded,

    #[error("editing session is closed")]
    Closed,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("malformed image encoding: {0}")]
    MalformedEncoding(#[from] EncodingError),

    #[error("image crop failed: {0}")]
    Crop(#[from] CropError),

    #[error("upload to {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("could not resolve download URL for {path}: {source}")]
    Retrieval {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("storage path rejected: {0}")]
    InvalidOwner(String),

    #[error("loading profile failed: {0}")]
    Load(#[source] ProfileServiceError),

    #[error("saving profile failed: {0}")]
    Persistence(#[source] ProfileServiceError),

    #[error("invalid phase transition {from} -> {to}")]
    InvalidTransition { from: EditPhase, to: EditPhase },
}

impl EditError {
    /// Failures the UI reports to the user. Capture and permission problems
    /// are deliberately not among them.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, EditError::Capture(_) | EditError::Busy { .. })
    }
}

impl From<UploadError> for EditError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Write { path, source } => {
                EditError::Upload { path, source }
            }
            UploadError::Retrieval { path, source } => {
                EditError::Retrieval { path, source }
            }
            UploadError::InvalidOwner(owner) => EditError::InvalidOwner(owner),
        }
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
