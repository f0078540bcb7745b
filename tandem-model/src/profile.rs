//! User profile document as stored by the profile service.

use std::fmt;

/// A language the user is studying.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StudyLanguage {
    /// ISO-ish language code (`"fr"`, `"en"`, ...)
    pub code: String,
    /// Display name shown next to the flag
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub level: Option<String>,
}

impl StudyLanguage {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// Which photo field an uploaded URL lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhotoSlot {
    /// The single profile picture (`photo`)
    Primary,
    /// Appended to the gallery (`otherPhotos`)
    Secondary,
}

impl fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoSlot::Primary => write!(f, "primary"),
            PhotoSlot::Secondary => write!(f, "secondary"),
        }
    }
}

/// The user document edited by the profile screen.
///
/// The profile service is the owner of record; an editing session only ever
/// holds a working copy of this value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UserProfile {
    pub uid: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: String,
    /// Primary photo URL
    #[cfg_attr(feature = "serde", serde(default))]
    pub photo: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub other_photos: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub about_me: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub study_languages: Vec<StudyLanguage>,
    /// Flat list of codes mirroring `study_languages`, kept for queries.
    #[cfg_attr(feature = "serde", serde(default))]
    pub languages_array: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub complete_profile: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub complete_languages: bool,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    /// Merge a freshly uploaded URL into the requested slot.
    pub fn merge_photo(&mut self, slot: PhotoSlot, url: impl Into<String>) {
        let url = url.into();
        match slot {
            PhotoSlot::Primary => self.photo = url,
            PhotoSlot::Secondary => self.other_photos.push(url),
        }
    }

    pub fn photo_for(&self, slot: PhotoSlot) -> Option<&str> {
        match slot {
            PhotoSlot::Primary => {
                (!self.photo.is_empty()).then_some(self.photo.as_str())
            }
            PhotoSlot::Secondary => self.other_photos.last().map(String::as_str),
        }
    }

    /// Drop every gallery entry equal to `url`. Returns how many were removed.
    pub fn remove_other_photo(&mut self, url: &str) -> usize {
        let before = self.other_photos.len();
        self.other_photos.retain(|item| item != url);
        before - self.other_photos.len()
    }

    /// Drop a study language from both the detailed list and the code index.
    /// Returns how many detailed entries were removed.
    pub fn remove_language(&mut self, code: &str) -> usize {
        let before = self.study_languages.len();
        self.study_languages.retain(|language| language.code != code);
        self.languages_array.retain(|item| item != code);
        before - self.study_languages.len()
    }

    pub fn language_codes(&self) -> impl Iterator<Item = &str> {
        self.study_languages.iter().map(|l| l.code.as_str())
    }
}
