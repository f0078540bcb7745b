//! Single-slot operation guard.
//!
//! At most one profile operation runs per session. Holding an
//! [`OperationToken`] is what "loading" means; dropping it, on any exit path,
//! frees the slot and returns the phase to `Idle`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

use super::phase::{EditPhase, OperationKind};
use crate::error::{EditError, Result};

#[derive(Debug, Default)]
struct SlotState {
    running: Option<OperationKind>,
    phase: EditPhase,
}

#[derive(Debug, Clone)]
pub struct OperationSlot {
    permits: Arc<Semaphore>,
    state: Arc<Mutex<SlotState>>,
}

impl Default for OperationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationSlot {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            state: Arc::new(Mutex::new(SlotState::default())),
        }
    }

    /// Claim the slot for `kind`, or fail with `Busy` naming the holder.
    pub fn try_begin(&self, kind: OperationKind) -> Result<OperationToken> {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                let running = self.state.lock().running.unwrap_or(kind);
                debug!(%kind, %running, "operation rejected, slot busy");
                return Err(EditError::Busy { running });
            }
        };

        let entry = kind.entry_phase();
        {
            let mut state = self.state.lock();
            state.running = Some(kind);
            state.phase = entry;
        }
        trace!(%kind, phase = %entry, "operation started");

        Ok(OperationToken {
            kind,
            state: self.state.clone(),
            _permit: permit,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }

    pub fn phase(&self) -> EditPhase {
        self.state.lock().phase
    }

    pub fn running(&self) -> Option<OperationKind> {
        self.state.lock().running
    }
}

/// Proof that the holder owns the session's only operation slot.
#[derive(Debug)]
pub struct OperationToken {
    kind: OperationKind,
    state: Arc<Mutex<SlotState>>,
    _permit: OwnedSemaphorePermit,
}

impl OperationToken {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn phase(&self) -> EditPhase {
        self.state.lock().phase
    }

    pub fn advance(&self, next: EditPhase) -> Result<()> {
        let mut state = self.state.lock();
        let from = state.phase;
        if !from.can_advance_to(next) {
            return Err(EditError::InvalidTransition { from, to: next });
        }
        state.phase = next;
        trace!(kind = %self.kind, %from, to = %next, "phase advanced");
        Ok(())
    }
}

impl Drop for OperationToken {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.running = None;
        state.phase = EditPhase::Idle;
        // The permit field drops after this body, so nobody can claim the
        // slot while the state still shows the old operation.
    }
}
