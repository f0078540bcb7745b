#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tandem_contracts::prelude::{
    CameraError, CameraProvider, ObjectStorage, PermissionState, StorageError,
    StoredObject,
};
use tandem_core::data_url;
use tandem_core::infra::{
    ChannelNotifier, InMemoryProfileService, MemoryObjectStorage,
};
use tandem_core::{EditSession, SessionServices, SessionSettings};
use tandem_model::{
    CaptureOptions, CapturedImage, ImageFormat, Platform, StudyLanguage, Toast,
    UserProfile,
};
use tokio::sync::{Notify, mpsc};

pub const UID: &str = "u1";
pub const CDN: &str = "https://cdn.example.test/";
pub const NOW_MILLIS: i64 = 1_700_000_000_000;

/// Payload of the fake PNG the scripted camera hands out.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-pixels";

pub fn png_data_url() -> String {
    data_url::encode("image/png", PNG_BYTES)
}

pub fn png_capture() -> CapturedImage {
    CapturedImage::new(png_data_url(), ImageFormat::Png, Platform::Native)
}

/// A real `width`x`height` PNG, for tests that decode pixels.
pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    let buffer =
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

pub fn sample_profile() -> UserProfile {
    let mut profile = UserProfile::new(UID);
    profile.display_name = "Ana".into();
    profile.photo = "https://cdn.example.test/p.png".into();
    profile.other_photos = vec!["a.png".into()];
    profile.about_me = "Hola!".into();
    profile.study_languages = vec![
        StudyLanguage::new("fr", "French"),
        StudyLanguage::new("en", "English"),
    ];
    profile.languages_array = vec!["fr".into(), "en".into()];
    profile.complete_profile = true;
    profile.complete_languages = true;
    profile
}

/// Camera that replays queued results, optionally parking until released.
pub struct ScriptedCamera {
    permission: Mutex<PermissionState>,
    photos: Mutex<VecDeque<Result<CapturedImage, CameraError>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub photo_calls: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(PermissionState::Granted),
            photos: Mutex::new(VecDeque::new()),
            gate: Mutex::new(None),
            photo_calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, result: Result<CapturedImage, CameraError>) {
        self.photos.lock().push_back(result);
    }

    pub fn set_permission(&self, permission: PermissionState) {
        *self.permission.lock() = permission;
    }

    /// Hold the next `get_photo` until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.photo_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraProvider for ScriptedCamera {
    async fn request_permissions(&self) -> Result<PermissionState, CameraError> {
        Ok(*self.permission.lock())
    }

    async fn get_photo(
        &self,
        _platform: Platform,
        _options: &CaptureOptions,
    ) -> Result<CapturedImage, CameraError> {
        self.photo_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.photos
            .lock()
            .pop_front()
            .unwrap_or(Err(CameraError::Cancelled))
    }
}

/// In-memory storage with injectable failures and an optional upload gate.
pub struct FlakyStorage {
    pub inner: MemoryObjectStorage,
    put_failure: Mutex<Option<StorageError>>,
    url_failure: Mutex<Option<StorageError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStorage::new(CDN).expect("base url"),
            put_failure: Mutex::new(None),
            url_failure: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }

    pub fn fail_puts(&self, err: StorageError) {
        *self.put_failure.lock() = Some(err);
    }

    pub fn fail_urls(&self, err: StorageError) {
        *self.url_failure.lock() = Some(err);
    }

    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ObjectStorage for FlakyStorage {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.put_failure.lock().clone() {
            return Err(err);
        }
        self.inner.put_object(path, bytes, content_type).await
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        if let Some(err) = self.url_failure.lock().clone() {
            return Err(err);
        }
        self.inner.download_url(path).await
    }
}

pub struct Harness {
    pub session: Arc<EditSession>,
    pub profiles: Arc<InMemoryProfileService>,
    pub storage: Arc<FlakyStorage>,
    pub camera: Arc<ScriptedCamera>,
    toasts: Mutex<mpsc::UnboundedReceiver<Toast>>,
}

impl Harness {
    pub fn new(profiles: InMemoryProfileService) -> Self {
        Self::with_settings(profiles, SessionSettings::default())
    }

    pub fn with_settings(
        profiles: InMemoryProfileService,
        settings: SessionSettings,
    ) -> Self {
        let profiles = Arc::new(profiles);
        let storage = Arc::new(FlakyStorage::new());
        let camera = Arc::new(ScriptedCamera::new());
        let (notifier, toasts) = ChannelNotifier::channel();

        let services = SessionServices {
            profiles: profiles.clone(),
            storage: storage.clone(),
            camera: camera.clone(),
            notifier: Arc::new(notifier),
        };
        let session = EditSession::new(services, settings)
            .with_upload_clock(|| NOW_MILLIS);

        Self {
            session: Arc::new(session),
            profiles,
            storage,
            camera,
            toasts: Mutex::new(toasts),
        }
    }

    /// A session opened on [`sample_profile`].
    pub async fn opened() -> Self {
        let harness = Self::new(InMemoryProfileService::new(sample_profile()));
        harness.session.open().await.expect("open session");
        harness
    }

    /// Every toast presented since the last call.
    pub fn toasts(&self) -> Vec<Toast> {
        let mut rx = self.toasts.lock();
        let mut out = Vec::new();
        while let Ok(toast) = rx.try_recv() {
            out.push(toast);
        }
        out
    }

    pub fn uploaded_url(&self, format: ImageFormat) -> String {
        format!("{CDN}users/{UID}/{NOW_MILLIS}.{}", format.extension())
    }
}

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
