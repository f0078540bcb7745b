//! # Tandem Core
//!
//! Profile editing for the Tandem language-exchange app: capture a photo,
//! decode it, upload it, merge the resulting URL into the user's profile and
//! persist the change, all while keeping the screen's loading state honest.
//!
//! ## Architecture
//!
//! - [`capture`]: permission check and picker invocation
//! - [`data_url`]: `data:<mime>;base64,<payload>` decoding
//! - [`imaging`]: optional crop of the captured image
//! - [`upload`]: storage path scheme and upload + URL resolution
//! - [`session`]: the [`EditSession`] state machine driving every action
//! - [`login`]: sign-in form rules and post-login routing
//! - [`infra`]: in-memory, filesystem and REST adapters for the collaborator
//!   traits in `tandem-contracts`
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tandem_core::infra::{
//!     FileCamera, InMemoryProfileService, LogNotifier, MemoryObjectStorage,
//! };
//! use tandem_core::{EditSession, SessionServices, SessionSettings};
//! use tandem_model::UserProfile;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let profiles = Arc::new(InMemoryProfileService::new(UserProfile::new("u1")));
//! let services = SessionServices {
//!     profiles,
//!     storage: Arc::new(MemoryObjectStorage::new("https://cdn.example.test/")?),
//!     camera: Arc::new(FileCamera::new("me.png")),
//!     notifier: Arc::new(LogNotifier),
//! };
//!
//! let session = EditSession::new(services, SessionSettings::default());
//! session.open().await?;
//! session.change_photo().await?;
//! session.close().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Permission check and picker invocation
pub mod capture;

/// Data-URL decoding into raw image bytes
pub mod data_url;

/// Error types for editing operations
pub mod error;

/// Image cropping before upload
pub mod imaging;

/// Adapters for storage, profile, camera and notification collaborators
pub mod infra;

/// Sign-in form validation and post-login routing
pub mod login;

/// The editing session state machine
pub mod session;

/// Upload coordination and storage path naming
pub mod upload;

pub use capture::{CaptureAdapter, CaptureError};
pub use data_url::EncodingError;
pub use error::{EditError, Result};
pub use imaging::CropError;
pub use session::{
    EditPhase, EditSession, FlowOutcome, OperationKind, SaveStatus,
    SessionServices, SessionSettings, SessionSnapshot,
};
pub use upload::{UploadCoordinator, UploadError, storage_path};
