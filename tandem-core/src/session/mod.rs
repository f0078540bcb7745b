//! Profile photo and about-me editing session.
//!
//! An [`EditSession`] owns the working copy of the signed-in user's profile
//! for as long as the edit screen is open. Photo actions run the full
//! capture -> convert -> upload -> merge -> persist chain; list edits and the
//! about-me save run only the merge -> persist tail. One operation runs at a
//! time, guarded by an [`OperationToken`].
//!
//! Closing the session stops the profile subscription. A photo upload that is
//! already running is allowed to finish, but its result is discarded.

mod guard;
mod phase;
mod settings;
mod subscription;

pub use guard::{OperationSlot, OperationToken};
pub use phase::{EditPhase, FlowOutcome, OperationKind, SaveStatus};
pub use settings::{SessionServices, SessionSettings};
pub use subscription::ProfileSubscription;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tandem_contracts::prelude::{Notifier, ProfileService};
use tandem_model::{
    CapturedImage, ImageFormat, PhotoSlot, RawBinary, Toast, UserProfile,
};
use tracing::{debug, error, info, instrument, warn};

use crate::capture::{CaptureAdapter, CaptureError};
use crate::data_url;
use crate::error::{EditError, Result};
use crate::imaging;
use crate::upload::UploadCoordinator;

const REFUSE_PRIMARY_DELETE: &str = "At least one profile picture required.";
const IMAGE_UNREADABLE: &str = "Could not read the selected image.";
const UPLOAD_FAILED: &str = "Photo upload failed. Please try again.";
const SAVE_FAILED: &str = "Changes could not be saved. Please try again.";
const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// A change merged into the working copy that the store has not confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingEdit {
    Photo { slot: PhotoSlot, url: String },
    RemovePhoto(String),
    RemoveLanguage(String),
    About(String),
}

impl PendingEdit {
    /// Idempotent, so replaying onto a snapshot that already carries the
    /// edit is a no-op. Returns whether the profile changed.
    fn apply(&self, profile: &mut UserProfile) -> bool {
        match self {
            PendingEdit::Photo {
                slot: PhotoSlot::Secondary,
                url,
            } if profile.other_photos.contains(url) => false,
            PendingEdit::Photo { slot, url } => {
                profile.merge_photo(*slot, url.clone());
                true
            }
            PendingEdit::RemovePhoto(url) => profile.remove_other_photo(url) > 0,
            PendingEdit::RemoveLanguage(code) => profile.remove_language(code) > 0,
            PendingEdit::About(text) => {
                let changed = profile.about_me != *text;
                profile.about_me = text.clone();
                changed
            }
        }
    }
}

#[derive(Debug, Default)]
struct WorkingState {
    profile: Option<UserProfile>,
    about_draft: String,
    /// `about_me` as last accepted by the profile store
    about_saved: String,
    about_save_enabled: bool,
    save_status: SaveStatus,
    /// Edits merged since the last confirmed write, oldest first
    unconfirmed: Vec<PendingEdit>,
}

impl WorkingState {
    /// Replace the working copy with a snapshot from the store of record.
    ///
    /// Edits the store has not confirmed are replayed on top, so a remote
    /// update never silently drops an unsaved change.
    fn adopt(&mut self, mut profile: UserProfile) {
        self.about_saved = profile.about_me.clone();
        for edit in &self.unconfirmed {
            edit.apply(&mut profile);
        }
        self.about_draft = profile.about_me.clone();
        self.about_save_enabled = self.about_draft != self.about_saved;
        if self.unconfirmed.is_empty() {
            self.save_status = SaveStatus::Synced;
        } else {
            debug!(
                pending = self.unconfirmed.len(),
                "replayed unconfirmed edits onto remote snapshot"
            );
        }
        self.profile = Some(profile);
    }
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: EditPhase,
    pub running: Option<OperationKind>,
    pub is_loading: bool,
    pub profile: Option<UserProfile>,
    pub about_draft: String,
    pub about_save_enabled: bool,
    pub save_status: SaveStatus,
    pub closed: bool,
}

pub struct EditSession {
    profiles: Arc<dyn ProfileService>,
    notifier: Arc<dyn Notifier>,
    capture: CaptureAdapter,
    uploader: UploadCoordinator,
    settings: SessionSettings,
    working: Arc<Mutex<WorkingState>>,
    slot: OperationSlot,
    subscription: Mutex<Option<ProfileSubscription>>,
    closed: AtomicBool,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("settings", &self.settings)
            .field("phase", &self.slot.phase())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl EditSession {
    pub fn new(services: SessionServices, settings: SessionSettings) -> Self {
        let SessionServices {
            profiles,
            storage,
            camera,
            notifier,
        } = services;

        Self {
            profiles,
            notifier,
            capture: CaptureAdapter::new(camera, settings.capture),
            uploader: UploadCoordinator::new(storage),
            settings,
            working: Arc::new(Mutex::new(WorkingState::default())),
            slot: OperationSlot::new(),
            subscription: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Use a fixed clock for upload path timestamps.
    pub fn with_upload_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.uploader = self.uploader.with_clock(clock);
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn phase(&self) -> EditPhase {
        self.slot.phase()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(ProfileSubscription::is_active)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.working.lock().profile.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.working.lock().save_status.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let working = self.working.lock();
        SessionSnapshot {
            phase: self.slot.phase(),
            running: self.slot.running(),
            is_loading: self.slot.is_busy(),
            profile: working.profile.clone(),
            about_draft: working.about_draft.clone(),
            about_save_enabled: working.about_save_enabled,
            save_status: working.save_status.clone(),
            closed: self.is_closed(),
        }
    }

    /// Load the user's profile and follow the live stream until [`close`].
    ///
    /// [`close`]: EditSession::close
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<()> {
        self.ensure_open()?;
        let _token = self.slot.try_begin(OperationKind::Load)?;

        let mut stream = self.profiles.subscribe();
        if let Err(err) = self.profiles.load_user_data().await {
            error!(error = %err, "failed to load user data");
            return Err(EditError::Load(err));
        }

        let current = stream.borrow_and_update().clone();
        match current {
            Some(profile) => {
                info!(uid = %profile.uid, "profile loaded");
                self.working.lock().adopt(profile);
            }
            None => debug!("no profile snapshot yet; waiting on stream"),
        }

        let working = self.working.clone();
        let subscription = ProfileSubscription::spawn(stream, move |profile| {
            working.lock().adopt(profile);
        });
        // Re-opening replaces (and thereby aborts) an earlier listener.
        let previous = self.subscription.lock().replace(subscription);
        drop(previous);
        Ok(())
    }

    /// Tear down the profile subscription. Further actions fail with `Closed`.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.cancel().await;
        }
        if self.slot.is_busy() {
            info!(
                running = ?self.slot.running(),
                "closed with an operation in flight; its result will be discarded"
            );
        }
    }

    /// Capture a new primary photo and save it.
    pub async fn change_photo(&self) -> Result<FlowOutcome> {
        self.photo_flow(PhotoSlot::Primary).await
    }

    /// Capture a photo and append it to the gallery.
    pub async fn add_other_photo(&self) -> Result<FlowOutcome> {
        self.photo_flow(PhotoSlot::Secondary).await
    }

    /// The primary photo cannot be removed, only replaced.
    pub async fn delete_primary_photo(&self) -> Result<FlowOutcome> {
        self.ensure_open()?;
        self.notify(Toast::info(REFUSE_PRIMARY_DELETE)).await;
        Ok(FlowOutcome::Refused)
    }

    /// Remove `url` from the gallery and save. Removing an absent entry still
    /// writes the (unchanged) profile.
    #[instrument(skip(self))]
    pub async fn delete_other_photo(&self, url: &str) -> Result<FlowOutcome> {
        self.ensure_open()?;
        let token = self.slot.try_begin(OperationKind::DeleteOtherPhoto)?;

        let snapshot =
            self.merge(&token, PendingEdit::RemovePhoto(url.to_string()))?;
        self.persist(&token, &snapshot).await?;
        Ok(FlowOutcome::Saved)
    }

    /// Remove every study language with `code` and save. Like photo
    /// deletion, an absent code still writes the profile.
    #[instrument(skip(self))]
    pub async fn delete_language(&self, code: &str) -> Result<FlowOutcome> {
        self.ensure_open()?;
        let token = self.slot.try_begin(OperationKind::DeleteLanguage)?;

        let snapshot =
            self.merge(&token, PendingEdit::RemoveLanguage(code.to_string()))?;
        self.persist(&token, &snapshot).await?;
        Ok(FlowOutcome::Saved)
    }

    /// Record an edit of the about-me text. Returns whether saving is
    /// enabled, i.e. whether the text differs from what the store holds.
    pub fn input_about_me(&self, text: impl Into<String>) -> Result<bool> {
        self.ensure_open()?;
        let text = text.into();
        let mut working = self.working.lock();
        let enabled = text != working.about_saved;

        let profile = working
            .profile
            .as_mut()
            .ok_or(EditError::ProfileNotLoaded)?;
        profile.about_me = text.clone();

        working.about_draft = text;
        working.about_save_enabled = enabled;
        Ok(enabled)
    }

    /// Persist the about-me draft. Refused without a write while the draft
    /// matches the stored text.
    #[instrument(skip(self))]
    pub async fn save_about_me(&self) -> Result<FlowOutcome> {
        self.ensure_open()?;
        let token = self.slot.try_begin(OperationKind::SaveAboutMe)?;

        let draft = {
            let working = self.working.lock();
            working.about_save_enabled.then(|| working.about_draft.clone())
        };
        let Some(draft) = draft else {
            debug!("about-me unchanged; nothing to save");
            return Ok(FlowOutcome::Refused);
        };

        let snapshot = self.merge(&token, PendingEdit::About(draft))?;
        self.persist(&token, &snapshot).await?;
        Ok(FlowOutcome::Saved)
    }

    #[instrument(skip(self))]
    async fn photo_flow(&self, slot: PhotoSlot) -> Result<FlowOutcome> {
        self.ensure_open()?;
        let owner = self.owner_id()?;
        let token = self.slot.try_begin(OperationKind::for_slot(slot))?;

        let captured = match self.capture.capture(self.settings.platform).await
        {
            Ok(captured) => captured,
            Err(err) => {
                // Picker problems end the flow quietly; the user sees no toast.
                match &err {
                    CaptureError::Cancelled => debug!("capture cancelled"),
                    other => warn!(error = %other, "capture failed"),
                }
                return Ok(FlowOutcome::NothingCaptured);
            }
        };
        if self.is_closed() {
            info!("session closed during capture; dropping image");
            return Ok(FlowOutcome::Discarded);
        }

        token.advance(EditPhase::Converting)?;
        let binary = match convert(&captured) {
            Ok(binary) => binary,
            Err(err) => return Err(self.report_failure(err).await),
        };

        token.advance(EditPhase::Uploading)?;
        let uploaded = match self
            .uploader
            .upload(binary.bytes, captured.format, &owner)
            .await
        {
            Ok(uploaded) => uploaded,
            Err(err) => return Err(self.report_failure(err.into()).await),
        };
        if self.is_closed() {
            info!(path = %uploaded.path, "session closed during upload; discarding result");
            return Ok(FlowOutcome::Discarded);
        }

        let snapshot = self.merge(
            &token,
            PendingEdit::Photo {
                slot,
                url: uploaded.url,
            },
        )?;
        self.persist(&token, &snapshot).await?;
        Ok(FlowOutcome::Saved)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(EditError::Closed);
        }
        Ok(())
    }

    fn owner_id(&self) -> Result<String> {
        let working = self.working.lock();
        let profile = working.profile.as_ref().ok_or(EditError::ProfileNotLoaded)?;
        if !profile.uid.is_empty() {
            return Ok(profile.uid.clone());
        }
        self.profiles.user_id().ok_or(EditError::ProfileNotLoaded)
    }

    /// Apply `edit` to the working copy and return what must be persisted.
    fn merge(&self, token: &OperationToken, edit: PendingEdit) -> Result<UserProfile> {
        if token.phase() != EditPhase::Merging {
            token.advance(EditPhase::Merging)?;
        }

        let mut working = self.working.lock();
        let profile = working
            .profile
            .as_mut()
            .ok_or(EditError::ProfileNotLoaded)?;
        if !edit.apply(profile) {
            debug!(?edit, "edit left the profile unchanged");
        }
        let snapshot = profile.clone();
        working.unconfirmed.push(edit);
        working.save_status = SaveStatus::Pending;
        Ok(snapshot)
    }

    async fn persist(
        &self,
        token: &OperationToken,
        profile: &UserProfile,
    ) -> Result<()> {
        token.advance(EditPhase::Persisting)?;
        let kind = token.kind();

        let written = match kind {
            OperationKind::ChangePhoto => {
                self.profiles.update_profile_picture(profile).await
            }
            OperationKind::AddOtherPhoto | OperationKind::DeleteOtherPhoto => {
                self.profiles.update_other_photos(profile).await
            }
            OperationKind::SaveAboutMe => self.profiles.update_about(profile).await,
            OperationKind::DeleteLanguage => {
                self.profiles.update_study_languages(profile).await
            }
            OperationKind::Load => Ok(()),
        };

        match written {
            Ok(()) => {
                {
                    let mut working = self.working.lock();
                    // The written document carried every earlier edit too.
                    working.unconfirmed.clear();
                    working.save_status = SaveStatus::Synced;
                    working.about_saved = profile.about_me.clone();
                    working.about_save_enabled =
                        working.about_draft != working.about_saved;
                }
                info!(%kind, uid = %profile.uid, "profile saved");
                self.notify(Toast::success(kind.success_message())).await;
                Ok(())
            }
            Err(source) => {
                self.working.lock().save_status = SaveStatus::Unsaved {
                    reason: source.to_string(),
                };
                Err(self.report_failure(EditError::Persistence(source)).await)
            }
        }
    }

    async fn report_failure(&self, err: EditError) -> EditError {
        warn!(error = %err, "profile operation failed");
        if err.is_user_visible() {
            self.notify(Toast::error(failure_message(&err))).await;
        }
        err
    }

    async fn notify(&self, toast: Toast) {
        self.notifier.present(self.settings.decorate(toast)).await;
    }
}

/// Decode the picker's data-URL and apply the user's crop, if any.
fn convert(captured: &CapturedImage) -> Result<RawBinary> {
    let mut binary = data_url::decode(&captured.data_url)?;

    match ImageFormat::from_mime(&binary.mime) {
        Ok(format) if format == captured.format => {}
        _ => warn!(
            mime = %binary.mime,
            declared = %captured.format,
            "data-URL MIME type disagrees with declared format"
        ),
    }

    if let Some(region) = captured.crop {
        binary.bytes = imaging::crop(&binary.bytes, captured.format, region)?;
        debug!(%region, size = binary.len(), "image cropped");
    }
    Ok(binary)
}

fn failure_message(err: &EditError) -> &'static str {
    match err {
        EditError::MalformedEncoding(_) | EditError::Crop(_) => IMAGE_UNREADABLE,
        EditError::Upload { .. }
        | EditError::Retrieval { .. }
        | EditError::InvalidOwner(_) => UPLOAD_FAILED,
        EditError::Persistence(_) => SAVE_FAILED,
        _ => GENERIC_FAILURE,
    }
}
