use std::sync::Arc;

use tracing::{debug, info};

use super::synchronizer::{SyncOptions, SyncOutcome};
use crate::{
    common::types::GuildId,
    playback::{EventKind, PlayerEvent},
    server::registry::SessionRegistry,
};

/// Extra work a lifecycle event carries besides re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Tear the session down; the final pass removes the control message.
    Leave,
}

/// How one kind of lifecycle event is turned into a synchronization trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub force: bool,
    /// Show the event's error message above the card.
    pub annotate: bool,
    pub side_effect: Option<SideEffect>,
}

const SYNC: Route = Route {
    force: false,
    annotate: false,
    side_effect: None,
};

pub const fn route(kind: EventKind) -> Route {
    match kind {
        // Queue order may have shifted, so start always re-posts the card.
        EventKind::Start => Route { force: true, ..SYNC },
        EventKind::FinishPlayback => Route {
            side_effect: Some(SideEffect::Leave),
            ..SYNC
        },
        EventKind::Error => Route {
            force: true,
            annotate: true,
            side_effect: None,
        },
        EventKind::Pause
        | EventKind::Resume
        | EventKind::Finish
        | EventKind::Loop
        | EventKind::LoopEnabled
        | EventKind::LoopDisabled
        | EventKind::Repeat
        | EventKind::RepeatEnabled
        | EventKind::RepeatDisabled
        | EventKind::Skip
        | EventKind::TrackAdd
        | EventKind::Mix
        | EventKind::VolumeUpdate => SYNC,
    }
}

/// What a single event turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Sync(SyncOptions),
    Leave,
}

pub fn trigger_for(event: &PlayerEvent) -> Trigger {
    let route = route(event.kind());
    if route.side_effect == Some(SideEffect::Leave) {
        return Trigger::Leave;
    }

    let override_text = if route.annotate {
        event.error_message().map(|m| format!("Error: {}", m))
    } else {
        None
    };
    Trigger::Sync(SyncOptions {
        force: route.force,
        override_text,
    })
}

/// A lifecycle event addressed to one guild.
#[derive(Debug, Clone)]
pub struct RoutedEvent {
    pub guild_id: GuildId,
    pub event: PlayerEvent,
    /// Queue revision the event was reported with.
    pub revision: Option<u64>,
}

/// Result of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No live session for the guild.
    NoSession,
    Synced(SyncOutcome),
    Left,
}

/// Turns playback lifecycle events into synchronization passes.
pub struct SessionRouter {
    registry: Arc<SessionRegistry>,
}

impl SessionRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn dispatch(&self, guild_id: &GuildId, event: &PlayerEvent) -> Dispatch {
        self.dispatch_at(guild_id, event, None).await
    }

    /// Routes `event`, reported together with queue revision `revision`.
    ///
    /// A queue-finished event is only honoured if no newer queue state has
    /// arrived since; otherwise the session stays and is refreshed.
    pub async fn dispatch_at(
        &self,
        guild_id: &GuildId,
        event: &PlayerEvent,
        revision: Option<u64>,
    ) -> Dispatch {
        match trigger_for(event) {
            Trigger::Leave => {
                if self.registry.leave_at(guild_id, revision).await {
                    info!("[{}] queue finished, session closed", guild_id);
                    return Dispatch::Left;
                }
                if self.registry.get(guild_id).is_none() {
                    return Dispatch::NoSession;
                }
                debug!(
                    "[{}] queue finish superseded by newer state, refreshing instead",
                    guild_id
                );
                self.sync(guild_id, event, SyncOptions::default()).await
            }
            Trigger::Sync(options) => self.sync(guild_id, event, options).await,
        }
    }

    async fn sync(&self, guild_id: &GuildId, event: &PlayerEvent, options: SyncOptions) -> Dispatch {
        let Some(session) = self.registry.get(guild_id) else {
            debug!("[{}] {:?} for unknown session ignored", guild_id, event.kind());
            return Dispatch::NoSession;
        };
        let outcome = self
            .registry
            .synchronizer()
            .synchronize(&session, options)
            .await;
        Dispatch::Synced(outcome)
    }

    /// Consumes events until every sender is dropped.
    ///
    /// Each event is dispatched on its own task so that a slow transport
    /// call never delays the queue; overlapping passes for one guild are
    /// coalesced by its gate.
    pub async fn run(self: Arc<Self>, events: flume::Receiver<RoutedEvent>) {
        while let Ok(RoutedEvent {
            guild_id,
            event,
            revision,
        }) = events.recv_async().await
        {
            let router = self.clone();
            tokio::spawn(async move {
                router.dispatch_at(&guild_id, &event, revision).await;
            });
        }
        debug!("event channel closed, router stopped");
    }
}
