use std::{sync::Arc, time::Duration};

use tracing::{debug, error, trace, warn};

use super::{gate::ControlSlot, render::ControlRenderer};
use crate::{
    common::TransportError,
    messaging::MessageTransport,
    playback::{PlaybackEngine, QueueSnapshot},
    server::session::PlaybackSession,
};

/// Options for a single synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Replace the message (delete then send) instead of editing it.
    pub force: bool,
    /// Transient text shown above the embed for this pass only.
    pub override_text: Option<String>,
}

impl SyncOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            override_text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.override_text = Some(text.into());
        self
    }
}

/// What a pass has to do, derived from the queue and the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing is playing.
    Idle,
    /// A track is nominally current but the engine is not ready.
    NotReady,
    NeedsPublish,
    NeedsEdit,
}

impl SyncState {
    pub fn classify(snapshot: Option<&QueueSnapshot>, has_message: bool, force: bool) -> Self {
        let Some(snapshot) = snapshot.filter(|s| s.current.is_some()) else {
            return Self::Idle;
        };
        if !snapshot.is_ready {
            Self::NotReady
        } else if force || !has_message {
            Self::NeedsPublish
        } else {
            Self::NeedsEdit
        }
    }
}

/// Result of a call to [`Synchronizer::synchronize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Another pass was in flight; this trigger was dropped.
    Coalesced,
    /// Nothing to show and nothing to remove.
    Unchanged,
    /// The existing message was deleted.
    Retired,
    Published,
    Edited,
    /// A transport call failed. The next trigger reconciles.
    Failed,
}

/// Delete attempts made by [`Synchronizer::retire`] before it gives up.
pub const RETIRE_ATTEMPTS: u32 = 5;
const RETIRE_BACKOFF: Duration = Duration::from_millis(500);
const RETIRE_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Keeps the one control message of each session in step with its queue.
pub struct Synchronizer {
    engine: Arc<dyn PlaybackEngine>,
    transport: Arc<dyn MessageTransport>,
    renderer: ControlRenderer,
}

impl Synchronizer {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        transport: Arc<dyn MessageTransport>,
        renderer: ControlRenderer,
    ) -> Self {
        Self {
            engine,
            transport,
            renderer,
        }
    }

    pub fn engine(&self) -> &Arc<dyn PlaybackEngine> {
        &self.engine
    }

    /// Runs one pass for `session`, or drops the request if a pass is
    /// already in flight. Never fails: transport errors are logged and left
    /// for the next trigger to repair.
    pub async fn synchronize(&self, session: &PlaybackSession, options: SyncOptions) -> SyncOutcome {
        let Some(mut slot) = session.gate().try_enter() else {
            trace!("[{}] control update in flight, trigger dropped", session.guild_id());
            return SyncOutcome::Coalesced;
        };
        self.run_pass(session, &mut slot, &options).await
    }

    /// Final pass for a session being destroyed: waits for any pass in
    /// flight, then removes the message whatever the queue looks like.
    ///
    /// No trigger follows this pass, so a failed delete is retried here with
    /// backoff, honouring the platform's rate-limit delay.
    pub async fn retire(&self, session: &PlaybackSession) -> SyncOutcome {
        let mut slot = session.gate().enter().await;
        session.close();

        let mut backoff = RETIRE_BACKOFF;
        for attempt in 1..=RETIRE_ATTEMPTS {
            let err = match self.delete_current(session, &mut slot).await {
                Ok(outcome) => return outcome,
                Err(e) => e,
            };
            if attempt == RETIRE_ATTEMPTS {
                error!(
                    "[{}] giving up on control message after {} delete attempts: {}",
                    session.guild_id(),
                    attempt,
                    err
                );
                break;
            }

            let wait = match &err {
                TransportError::RateLimited { retry_after_ms } => {
                    Duration::from_millis(*retry_after_ms).min(RETIRE_BACKOFF_MAX)
                }
                _ => backoff,
            };
            warn!(
                "[{}] delete attempt {} failed ({}), retrying in {:?}",
                session.guild_id(),
                attempt,
                err,
                wait
            );
            tokio::time::sleep(wait).await;
            backoff = (backoff * 2).min(RETIRE_BACKOFF_MAX);
        }
        SyncOutcome::Failed
    }

    async fn run_pass(
        &self,
        session: &PlaybackSession,
        slot: &mut ControlSlot,
        options: &SyncOptions,
    ) -> SyncOutcome {
        let snapshot = if session.is_closed() {
            None
        } else {
            self.engine.snapshot(session.guild_id()).await
        };

        let state = SyncState::classify(snapshot.as_ref(), slot.message.is_some(), options.force);
        trace!("[{}] sync pass: {:?}", session.guild_id(), state);

        let snapshot = match (state, snapshot) {
            (SyncState::NeedsPublish | SyncState::NeedsEdit, Some(snapshot)) => snapshot,
            _ => return self.teardown(session, slot).await,
        };
        let Some(payload) = self
            .renderer
            .render(&snapshot, options.override_text.as_deref())
        else {
            return self.teardown(session, slot).await;
        };

        if state == SyncState::NeedsEdit {
            let Some(handle) = slot.message.clone() else {
                return SyncOutcome::Unchanged;
            };
            return match self.transport.edit_message(&handle, &payload).await {
                Ok(()) => SyncOutcome::Edited,
                Err(e) if e.is_gone() => {
                    debug!(
                        "[{}] control message {} vanished, will republish",
                        session.guild_id(),
                        handle
                    );
                    slot.message = None;
                    SyncOutcome::Failed
                }
                Err(e) => {
                    warn!(
                        "[{}] failed to edit control message {}: {}",
                        session.guild_id(),
                        handle,
                        e
                    );
                    SyncOutcome::Failed
                }
            };
        }

        // A new message is only sent once the old one is confirmed gone.
        if self.teardown(session, slot).await == SyncOutcome::Failed {
            return SyncOutcome::Failed;
        }

        match self
            .transport
            .send_message(session.channel_id(), &payload)
            .await
        {
            Ok(handle) => {
                debug!("[{}] published control message {}", session.guild_id(), handle);
                slot.message = Some(handle);
                SyncOutcome::Published
            }
            Err(e) => {
                warn!(
                    "[{}] failed to publish control message in {}: {}",
                    session.guild_id(),
                    session.channel_id(),
                    e
                );
                SyncOutcome::Failed
            }
        }
    }

    /// Deletes the current message, if any. The handle is kept when the
    /// delete fails so the next pass can try again.
    async fn teardown(&self, session: &PlaybackSession, slot: &mut ControlSlot) -> SyncOutcome {
        match self.delete_current(session, slot).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("[{}] failed to delete control message: {}", session.guild_id(), e);
                SyncOutcome::Failed
            }
        }
    }

    /// A 404 counts as deleted. On any other error the handle is put back.
    async fn delete_current(
        &self,
        session: &PlaybackSession,
        slot: &mut ControlSlot,
    ) -> Result<SyncOutcome, TransportError> {
        let Some(handle) = slot.message.take() else {
            return Ok(SyncOutcome::Unchanged);
        };

        match self.transport.delete_message(&handle).await {
            Ok(()) => {
                debug!("[{}] deleted control message {}", session.guild_id(), handle);
                Ok(SyncOutcome::Retired)
            }
            Err(e) if e.is_gone() => Ok(SyncOutcome::Retired),
            Err(e) => {
                slot.message = Some(handle);
                Err(e)
            }
        }
    }
}
