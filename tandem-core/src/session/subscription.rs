//! Scoped listener on the live profile stream.

use tandem_contracts::prelude::ProfileStream;
use tandem_model::UserProfile;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Background task forwarding profile snapshots to a callback.
///
/// The listener owns the stream receiver, so stopping the task is what
/// unsubscribes. Dropping the handle aborts the task; [`cancel`] also waits
/// for the receiver to be released.
///
/// [`cancel`]: ProfileSubscription::cancel
#[derive(Debug)]
pub struct ProfileSubscription {
    handle: Option<JoinHandle<()>>,
}

impl ProfileSubscription {
    /// Spawn a listener for every snapshot the stream has not yet marked as
    /// seen. Callers that already consumed the current value with
    /// `borrow_and_update` only get later publications.
    pub fn spawn<F>(mut stream: ProfileStream, mut on_snapshot: F) -> Self
    where
        F: FnMut(UserProfile) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            while stream.changed().await.is_ok() {
                let snapshot = stream.borrow_and_update().clone();
                match snapshot {
                    Some(profile) => {
                        trace!(uid = %profile.uid, "profile snapshot received");
                        on_snapshot(profile);
                    }
                    None => debug!("profile stream cleared"),
                }
            }
            debug!("profile stream closed by publisher");
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop listening and wait until the stream receiver has been dropped.
    pub async fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation surfaces as a JoinError; that is the expected end.
            let _ = handle.await;
        }
    }
}

impl Drop for ProfileSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
