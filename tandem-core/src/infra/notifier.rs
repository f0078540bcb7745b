use async_trait::async_trait;
use tandem_contracts::prelude::Notifier;
use tandem_model::{Toast, ToastKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Writes toasts to the log; used by headless drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn present(&self, toast: Toast) {
        let duration_ms = toast.duration.as_millis() as u64;
        match toast.kind {
            ToastKind::Error => warn!(
                position = %toast.position,
                duration_ms,
                "toast: {}",
                toast.message
            ),
            ToastKind::Success | ToastKind::Info => info!(
                position = %toast.position,
                duration_ms,
                "toast: {}",
                toast.message
            ),
        }
    }
}

/// Forwards toasts to a UI task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn present(&self, toast: Toast) {
        if let Err(err) = self.tx.send(toast) {
            debug!(message = %err.0.message, "toast dropped, no UI listening");
        }
    }
}
