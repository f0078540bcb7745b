use async_trait::async_trait;
use tandem_model::UserProfile;
use thiserror::Error;
use tokio::sync::watch;

/// Live view of the signed-in user's profile document.
///
/// `None` until the first snapshot arrives or after sign-out.
pub type ProfileStream = watch::Receiver<Option<UserProfile>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileServiceError {
    #[error("no signed-in user")]
    NotSignedIn,

    #[error("profile document not found for {0}")]
    NotFound(String),

    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    #[error("profile update rejected: {0}")]
    Rejected(String),
}

/// Authentication and profile-document collaborator.
///
/// Each `update_*` call persists the whole profile it is handed; the name only
/// says which screen action produced the write.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Id of the signed-in user, if any.
    fn user_id(&self) -> Option<String>;

    /// Kick off (or refresh) delivery of the user's document into the stream.
    async fn load_user_data(&self) -> Result<(), ProfileServiceError>;

    /// Subscribe to profile snapshots. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> ProfileStream;

    async fn update_profile_picture(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError>;

    async fn update_other_photos(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError>;

    async fn update_about(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError>;

    async fn update_study_languages(
        &self,
        profile: &UserProfile,
    ) -> Result<(), ProfileServiceError>;
}
