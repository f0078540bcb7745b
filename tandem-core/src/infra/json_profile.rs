use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tandem_contracts::prelude::{
    ProfileService, ProfileServiceError, ProfileStream,
};
use tandem_model::UserProfile;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

/// Profile document kept as a JSON file on disk.
///
/// The signed-in user is whoever the file belongs to. Each accepted write
/// replaces the file atomically and is published on the stream.
#[derive(Debug)]
pub struct JsonFileProfileService {
    path: PathBuf,
    tx: watch::Sender<Option<UserProfile>>,
    write_lock: Mutex<()>,
}

impl JsonFileProfileService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            path: path.into(),
            tx,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<UserProfile, ProfileServiceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProfileServiceError::NotFound(
                    self.path.display().to_string(),
                ));
            }
            Err(err) => {
                return Err(ProfileServiceError::Unavailable(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&raw).map_err(|err| {
            ProfileServiceError::Unavailable(format!(
                "invalid profile document {}: {err}",
                self.path.display()
            ))
        })
    }

    async fn write(
        &self,
        action: &'static str,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        let _guard = self.write_lock.lock().await;

        if let Some(uid) = self.user_id()
            && uid != profile.uid
        {
            return Err(ProfileServiceError::Rejected(format!(
                "cannot write profile {} as {uid}",
                profile.uid
            )));
        }

        let body = serde_json::to_vec_pretty(profile).map_err(|err| {
            ProfileServiceError::Rejected(format!("unserializable profile: {err}"))
        })?;
        let tmp = self.path.with_extension("json.tmp");
        let unavailable = |err: std::io::Error| {
            ProfileServiceError::Unavailable(format!(
                "failed to write {}: {err}",
                self.path.display()
            ))
        };
        tokio::fs::write(&tmp, &body).await.map_err(unavailable)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(unavailable)?;

        info!(action, uid = %profile.uid, path = %self.path.display(), "profile written");
        self.tx.send_replace(Some(profile.clone()));
        Ok(())
    }
}

#[async_trait]
impl ProfileService for JsonFileProfileService {
    fn user_id(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|profile| profile.uid.clone())
    }

    async fn load_user_data(&self) -> Result<(), ProfileServiceError> {
        let profile = self.read().await?;
        debug!(uid = %profile.uid, "profile document loaded");
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
        self.write("update_profile_picture", profile).await
    }

    async fn update_other_photos(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write("update_other_photos", profile).await
    }

    async fn update_about(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write("update_about", profile).await
    }

    async fn update_study_languages(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError> {
        self.write("update_study_languages", profile).await
    }
}
