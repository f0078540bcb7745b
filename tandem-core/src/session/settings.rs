use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tandem_contracts::prelude::{
    CameraProvider, Notifier, ObjectStorage, ProfileService,
};
use tandem_model::{
    CaptureOptions, DEFAULT_TOAST_DURATION, Platform, Toast, ToastPosition,
};

/// Per-session knobs, usually derived from the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub platform: Platform,
    pub capture: CaptureOptions,
    pub toast_duration: Duration,
    pub toast_position: ToastPosition,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            platform: Platform::Native,
            capture: CaptureOptions::default(),
            toast_duration: DEFAULT_TOAST_DURATION,
            toast_position: ToastPosition::Bottom,
        }
    }
}

impl SessionSettings {
    /// Apply the configured duration and position to a toast.
    pub fn decorate(&self, toast: Toast) -> Toast {
        toast
            .with_duration(self.toast_duration)
            .with_position(self.toast_position)
    }
}

/// External collaborators an editing session needs.
#[derive(Clone)]
pub struct SessionServices {
    pub profiles: Arc<dyn ProfileService>,
    pub storage: Arc<dyn ObjectStorage>,
    pub camera: Arc<dyn CameraProvider>,
    pub notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}
