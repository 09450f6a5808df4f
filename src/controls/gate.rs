use tokio::sync::{Mutex, MutexGuard};

use crate::messaging::MessageHandle;

/// The control message a session currently owns, if any.
#[derive(Debug, Default)]
pub struct ControlSlot {
    pub message: Option<MessageHandle>,
}

/// Proof that the holder is the only render/publish cycle in flight for a
/// session. Dropping it (including during unwinding or when the owning
/// future is cancelled) reopens the gate.
pub type GateGuard<'a> = MutexGuard<'a, ControlSlot>;

/// Per-session update serializer.
///
/// The control slot lives inside the lock, so the message handle can only be
/// read or replaced by whoever holds the gate.
#[derive(Debug, Default)]
pub struct UpdateGate {
    slot: Mutex<ControlSlot>,
}

impl UpdateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the gate if it is free. A busy gate returns `None` and the
    /// caller is expected to drop its request: whoever is inside will render
    /// state at least as fresh, and the next trigger picks up anything later.
    pub fn try_enter(&self) -> Option<GateGuard<'_>> {
        self.slot.try_lock().ok()
    }

    /// Waits for the gate. Only teardown uses this, since a final pass must
    /// not be coalesced away.
    pub async fn enter(&self) -> GateGuard<'_> {
        self.slot.lock().await
    }

    pub fn is_locked(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}
