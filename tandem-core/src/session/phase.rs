//! Orchestration phases and the operations that drive them.

use std::fmt::{self, Display};

use tandem_model::PhotoSlot;

/// Where the single in-flight operation currently is.
///
/// Photo flows walk `Capturing -> Converting -> Uploading -> Merging ->
/// Persisting`; list edits and the about-me save enter at `Merging`. Every
/// operation returns to `Idle` when its token is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Loading,
    Capturing,
    Converting,
    Uploading,
    Merging,
    Persisting,
}

impl EditPhase {
    pub fn can_advance_to(self, next: EditPhase) -> bool {
        use EditPhase::*;

        matches!(
            (self, next),
            (_, Idle)
                | (Idle, Loading | Capturing | Merging)
                | (Capturing, Converting)
                | (Converting, Uploading)
                | (Uploading, Merging)
                | (Merging, Persisting)
        )
    }
}

impl Display for EditPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditPhase::Idle => "idle",
            EditPhase::Loading => "loading",
            EditPhase::Capturing => "capturing",
            EditPhase::Converting => "converting",
            EditPhase::Uploading => "uploading",
            EditPhase::Merging => "merging",
            EditPhase::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// User-triggered actions that need the operation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Load,
    ChangePhoto,
    AddOtherPhoto,
    DeleteOtherPhoto,
    SaveAboutMe,
    DeleteLanguage,
}

impl OperationKind {
    pub fn for_slot(slot: PhotoSlot) -> Self {
        match slot {
            PhotoSlot::Primary => OperationKind::ChangePhoto,
            PhotoSlot::Secondary => OperationKind::AddOtherPhoto,
        }
    }

    pub fn entry_phase(self) -> EditPhase {
        match self {
            OperationKind::Load => EditPhase::Loading,
            OperationKind::ChangePhoto | OperationKind::AddOtherPhoto => {
                EditPhase::Capturing
            }
            OperationKind::DeleteOtherPhoto
            | OperationKind::SaveAboutMe
            | OperationKind::DeleteLanguage => EditPhase::Merging,
        }
    }

    /// Confirmation shown after the profile write succeeds.
    pub fn success_message(self) -> &'static str {
        match self {
            OperationKind::Load => "Profile loaded.",
            OperationKind::ChangePhoto => "Profile Picture Updated.",
            OperationKind::AddOtherPhoto => "Other Image Added.",
            OperationKind::DeleteOtherPhoto => "Other Image Deleted.",
            OperationKind::SaveAboutMe => "About me saved.",
            OperationKind::DeleteLanguage => "Language deleted.",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Load => "load",
            OperationKind::ChangePhoto => "change_photo",
            OperationKind::AddOtherPhoto => "add_other_photo",
            OperationKind::DeleteOtherPhoto => "delete_other_photo",
            OperationKind::SaveAboutMe => "save_about_me",
            OperationKind::DeleteLanguage => "delete_language",
        };
        f.write_str(name)
    }
}

/// Whether the working copy matches what the profile store last accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Synced,
    /// A write is in flight
    Pending,
    /// The last write failed; the working copy holds changes the store lacks
    Unsaved { reason: String },
}

impl SaveStatus {
    pub fn is_unsaved(&self) -> bool {
        matches!(self, SaveStatus::Unsaved { .. })
    }
}

/// How a completed (non-error) operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Profile written and confirmed
    Saved,
    /// Capture cancelled, denied or failed; nothing changed
    NothingCaptured,
    /// Session closed while the upload ran; result dropped
    Discarded,
    /// Action refused by a product rule; nothing changed
    Refused,
}
