use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    common::types::{ChannelId, GuildId, now_ms},
    controls::gate::UpdateGate,
    messaging::MessageHandle,
};

/// One guild's playback session and the control message that represents it.
///
/// Queue state is not stored here: it is read from the playback engine at
/// the start of every pass.
pub struct PlaybackSession {
    guild_id: GuildId,
    /// Fixed for the lifetime of the session.
    channel_id: ChannelId,
    gate: UpdateGate,
    closed: AtomicBool,
    cancel: CancellationToken,
    ticker: Mutex<Option<tokio::task::JoinHandle<()>>>,
    created_at: u64,
}

impl PlaybackSession {
    pub fn new(guild_id: GuildId, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            channel_id,
            gate: UpdateGate::new(),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            ticker: Mutex::new(None),
            created_at: now_ms(),
        }
    }

    pub fn guild_id(&self) -> &GuildId {
        &self.guild_id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn gate(&self) -> &UpdateGate {
        &self.gate
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// True while a render/publish pass is in flight.
    pub fn is_updating(&self) -> bool {
        self.gate.is_locked()
    }

    /// The published control message, once any pass in flight has finished.
    pub async fn control_message(&self) -> Option<MessageHandle> {
        self.gate.enter().await.message.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn set_ticker(&self, handle: tokio::task::JoinHandle<()>) {
        if let Some(previous) = self.ticker.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Stops the periodic refresh once the current tick, if any, is done.
    ///
    /// The ticker is not aborted: a pass in flight may already have created
    /// a message on the platform and must be allowed to record its handle.
    pub fn shutdown(&self) {
        tracing::info!("[{}] shutting down playback session", self.guild_id);
        self.cancel.cancel();
    }

    /// Waits for the ticker to exit after [`PlaybackSession::shutdown`].
    pub async fn join_ticker(&self) {
        let ticker = self.ticker.lock().take();
        if let Some(ticker) = ticker {
            if let Err(e) = ticker.await {
                if e.is_panic() {
                    tracing::warn!("[{}] refresh ticker panicked", self.guild_id);
                }
            }
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        tracing::debug!("[{}] dropping playback session", self.guild_id);
        self.cancel.cancel();
        if let Some(ticker) = self.ticker.get_mut().take() {
            ticker.abort();
        }
    }
}
