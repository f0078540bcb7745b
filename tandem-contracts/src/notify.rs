use async_trait::async_trait;
use tandem_model::Toast;

/// Timed on-screen message display.
///
/// Presenting is fire-and-forget: a notifier that cannot show a toast logs
/// and moves on rather than failing the flow that produced it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn present(&self, toast: Toast);
}
