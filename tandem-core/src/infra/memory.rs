//! Process-local collaborators for demos and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tandem_contracts::prelude::{
    ObjectStorage, ProfileService, ProfileServiceError, ProfileStream,
    StorageError, StoredObject,
};
use tandem_model::UserProfile;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use super::check_object_path;

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object storage backed by a map; URLs are joined onto a public base.
#[derive(Debug)]
pub struct MemoryObjectStorage {
    base: Url,
    objects: Mutex<BTreeMap<String, StoredBlob>>,
}

impl MemoryObjectStorage {
    pub fn new(public_base_url: &str) -> Result<Self, StorageError> {
        Ok(Self {
            base: directory_url(public_base_url)?,
            objects: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .get(path)
            .map(|blob| (blob.bytes.clone(), blob.content_type.clone()))
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

/// Parse a base URL so that `join` appends rather than replaces the last
/// path segment.
pub(crate) fn directory_url(raw: &str) -> Result<Url, StorageError> {
    let mut url = Url::parse(raw)
        .map_err(|err| StorageError::InvalidPath(format!("{raw}: {err}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn public_url(base: &Url, path: &str) -> Result<String, StorageError> {
    base.join(path)
        .map(String::from)
        .map_err(|err| StorageError::InvalidPath(format!("{path}: {err}")))
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        check_object_path(path)?;
        let size = bytes.len() as u64;
        self.objects.lock().insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        debug!(path, size, "object stored in memory");
        Ok(StoredObject {
            path: path.to_string(),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        check_object_path(path)?;
        if !self.objects.lock().contains_key(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        public_url(&self.base, path)
    }
}

/// Which profile-update call produced a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpdate {
    ProfilePicture,
    OtherPhotos,
    About,
    StudyLanguages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileWrite {
    pub update: ProfileUpdate,
    pub profile: UserProfile,
}

/// Profile store held in memory, publishing every accepted write.
#[derive(Debug)]
pub struct InMemoryProfileService {
    uid: Option<String>,
    stored: Mutex<Option<UserProfile>>,
    tx: watch::Sender<Option<UserProfile>>,
    writes: Mutex<Vec<ProfileWrite>>,
    write_failure: Mutex<Option<ProfileServiceError>>,
}

impl InMemoryProfileService {
    /// Signed in as `profile.uid`, whose document is `profile`. Nothing is
    /// published until [`load_user_data`] runs.
    ///
    /// [`load_user_data`]: ProfileService::load_user_data
    pub fn new(profile: UserProfile) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            uid: Some(profile.uid.clone()),
            stored: Mutex::new(Some(profile)),
            tx,
            writes: Mutex::new(Vec::new()),
            write_failure: Mutex::new(None),
        }
    }

    pub fn signed_out() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            uid: None,
            stored: Mutex::new(None),
            tx,
            writes: Mutex::new(Vec::new()),
            write_failure: Mutex::new(None),
        }
    }

    /// Simulate a change made elsewhere (another device, a backend job).
    pub fn publish_remote(&self, profile: UserProfile) {
        *self.stored.lock() = Some(profile.clone());
        self.tx.send_replace(Some(profile));
    }

    /// Make every following `update_*` call fail with `err` (or succeed
    /// again with `None`).
    pub fn set_write_failure(&self, err: Option<ProfileServiceError>) {
        *self.write_failure.lock() = err;
    }

    pub fn current(&self) -> Option<UserProfile> {
        self.stored.lock().clone()
    }

    pub fn writes(&self) -> Vec<ProfileWrite> {
        self.writes.lock().clone()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn write(
        &self,
        update: ProfileUpdate,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        if let Some(err) = self.write_failure.lock().clone() {
            return Err(err);
        }
        if self.uid.as_deref() != Some(profile.uid.as_str()) {
            return Err(ProfileServiceError::Rejected(format!(
                "cannot write profile {} as {:?}",
                profile.uid, self.uid
            )));
        }

        self.writes.lock().push(ProfileWrite {
            update,
            profile: profile.clone(),
        });
        *self.stored.lock() = Some(profile.clone());
        self.tx.send_replace(Some(profile.clone()));
        Ok(())
    }
}

#[async_trait]
impl ProfileService for InMemoryProfileService {
    fn user_id(&self) -> Option<String> {
        self.uid.clone()
    }

    async fn load_user_data(&self) -> Result<(), ProfileServiceError> {
        let uid = self.uid.clone().ok_or(ProfileServiceError::NotSignedIn)?;
        let profile = self
            .stored
            .lock()
            .clone()
            .ok_or(ProfileServiceError::NotFound(uid))?;
        self.tx.send_replace(Some(profile));
        Ok(())
    }

    fn subscribe(&self) -> ProfileStream {
        self.tx.subscribe()
    }

    async fn update_profile_picture(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write(ProfileUpdate::ProfilePicture, profile)
    }

    async fn update_other_photos(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write(ProfileUpdate::OtherPhotos, profile)
    }

    async fn update_about(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write(ProfileUpdate::About, profile)
    }

    async fn update_study_languages(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write(ProfileUpdate::StudyLanguages, profile)
    }
}
