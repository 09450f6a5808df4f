use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::join_all;
use tracing::info;

use super::session::PlaybackSession;
use crate::{
    common::types::{ChannelId, GuildId},
    controls::{synchronizer::Synchronizer, ticker::spawn_refresh_ticker},
    playback::is_superseded,
};

/// Owns every live playback session, keyed by guild.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<PlaybackSession>>,
    synchronizer: Arc<Synchronizer>,
    refresh_interval: Duration,
}

impl SessionRegistry {
    pub fn new(synchronizer: Arc<Synchronizer>, refresh_interval: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            synchronizer,
            refresh_interval,
        }
    }

    pub fn synchronizer(&self) -> &Arc<Synchronizer> {
        &self.synchronizer
    }

    pub fn get(&self, guild_id: &GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.get(guild_id).map(|s| s.value().clone())
    }

    /// Returns the guild's session, creating it (and its refresh ticker) on
    /// first use. `channel_id` is ignored for an existing session.
    pub fn get_or_create(&self, guild_id: &GuildId, channel_id: &ChannelId) -> Arc<PlaybackSession> {
        if let Some(existing) = self.get(guild_id) {
            return existing;
        }

        self.sessions
            .entry(guild_id.clone())
            .or_insert_with(|| {
                let session = Arc::new(PlaybackSession::new(guild_id.clone(), channel_id.clone()));
                let ticker = spawn_refresh_ticker(
                    Arc::downgrade(&session),
                    self.synchronizer.clone(),
                    self.refresh_interval,
                    session.cancel_token(),
                );
                session.set_ticker(ticker);
                info!(
                    "[{}] playback session created, controls in channel {}",
                    guild_id, channel_id
                );
                session
            })
            .value()
            .clone()
    }

    /// Destroys the guild's session: stops its ticker, releases the
    /// engine's playback resources and removes the control message.
    /// Returns false when there was no session.
    pub async fn leave(&self, guild_id: &GuildId) -> bool {
        self.leave_at(guild_id, None).await
    }

    /// Like [`SessionRegistry::leave`], for a request made against queue
    /// revision `seen`. Returns false, leaving everything in place, when the
    /// engine has reported newer state since.
    pub async fn leave_at(&self, guild_id: &GuildId, seen: Option<u64>) -> bool {
        let engine = self.synchronizer.engine();
        let Some((_, session)) = self
            .sessions
            .remove_if(guild_id, |_, _| !is_superseded(engine.as_ref(), guild_id, seen))
        else {
            return false;
        };

        session.shutdown();
        engine.leave(guild_id, seen).await;
        self.synchronizer.retire(&session).await;
        session.join_ticker().await;
        info!("[{}] playback session destroyed", guild_id);
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> Vec<Arc<PlaybackSession>> {
        self.sessions.iter().map(|s| s.value().clone()).collect()
    }

    /// Tears down every session concurrently, for process shutdown.
    pub async fn shutdown_all(&self) {
        let guilds: Vec<GuildId> = self.sessions.iter().map(|s| s.key().clone()).collect();
        join_all(guilds.iter().map(|guild_id| self.leave(guild_id))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controls::{
            render::ControlRenderer,
            synchronizer::{SyncOptions, SyncOutcome},
        },
        messaging::{MemoryTransport, memory::Op},
        playback::{QueueSnapshot, SnapshotStore, Track},
    };

    fn setup() -> (Arc<SnapshotStore>, Arc<MemoryTransport>, SessionRegistry) {
        let store = Arc::new(SnapshotStore::new());
        let transport = Arc::new(MemoryTransport::new());
        let sync = Arc::new(Synchronizer::new(
            store.clone(),
            transport.clone(),
            ControlRenderer::default(),
        ));
        (store, transport, SessionRegistry::new(sync, Duration::from_secs(10)))
    }

    fn playing(position_ms: u64) -> QueueSnapshot {
        QueueSnapshot {
            current: Some(Track::new("Song").with_duration_ms(120_000)),
            is_playing: true,
            is_ready: true,
            position_ms,
            ..QueueSnapshot::default()
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (_, _, registry) = setup();
        let guild = GuildId::from("g");
        let a = registry.get_or_create(&guild, &ChannelId::from("c1"));
        let b = registry.get_or_create(&guild, &ChannelId::from("c2"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.channel_id(), &ChannelId::from("c1"));
        assert_eq!(registry.len(), 1);
        assert!(a.has_ticker());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_refreshes_on_interval() {
        let (store, transport, registry) = setup();
        let guild = GuildId::from("g");
        store.update(guild.clone(), playing(0));
        registry.get_or_create(&guild, &ChannelId::from("c"));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(transport.count(Op::Send), 1);

        store.update(guild.clone(), playing(10_000));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.count(Op::Edit), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.count(Op::Edit), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_stops_ticker_and_removes_message() {
        let (store, transport, registry) = setup();
        let guild = GuildId::from("g");
        store.update(guild.clone(), playing(0));
        let session = registry.get_or_create(&guild, &ChannelId::from("c"));
        let outcome = registry
            .synchronizer()
            .synchronize(&session, SyncOptions::default())
            .await;
        assert_eq!(outcome, SyncOutcome::Published);

        assert!(registry.leave(&guild).await);
        assert!(registry.get(&guild).is_none());
        assert!(transport.live_messages().is_empty());
        assert!(store.get(&guild).is_none());
        assert!(!session.has_ticker());

        transport.clear_calls();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(transport.calls().is_empty());

        assert!(!registry.leave(&guild).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_while_ticker_is_mid_send() {
        let (store, transport, registry) = setup();
        let registry = Arc::new(registry);
        let guild = GuildId::from("g");
        store.update(guild.clone(), playing(0));
        let session = registry.get_or_create(&guild, &ChannelId::from("c"));

        // The message exists on the platform but the response is slow.
        transport.hold();
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(transport.count(Op::Send), 1);
        assert_eq!(transport.live_messages().len(), 1);
        assert!(session.is_updating());

        let leaving = {
            let registry = registry.clone();
            let guild = guild.clone();
            tokio::spawn(async move { registry.leave(&guild).await })
        };
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!leaving.is_finished());

        transport.release();
        assert!(leaving.await.unwrap());
        assert_eq!(transport.count(Op::Delete), 1);
        assert!(transport.live_messages().is_empty());
        assert!(!session.has_ticker());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.count(Op::Send), 1);
        assert!(transport.live_messages().is_empty());
    }

    #[tokio::test]
    async fn test_leave_at_stale_revision_keeps_session() {
        let (store, transport, registry) = setup();
        let guild = GuildId::from("g");
        let seen = store.update(guild.clone(), QueueSnapshot::default());
        registry.get_or_create(&guild, &ChannelId::from("c"));
        let latest = store.update(guild.clone(), playing(0));

        assert!(!registry.leave_at(&guild, Some(seen)).await);
        assert!(registry.get(&guild).is_some());
        assert!(store.get(&guild).is_some());
        assert!(transport.calls().is_empty());

        assert!(registry.leave_at(&guild, Some(latest)).await);
        assert!(registry.get(&guild).is_none());
        assert!(store.get(&guild).is_none());
    }

    #[tokio::test]
    async fn test_leave_waits_for_pass_in_flight() {
        let (store, transport, registry) = setup();
        let guild = GuildId::from("g");
        store.update(guild.clone(), playing(0));
        let session = registry.get_or_create(&guild, &ChannelId::from("c"));
        let registry = Arc::new(registry);

        transport.hold();
        let publishing = {
            let registry = registry.clone();
            let session = session.clone();
            tokio::spawn(async move {
                registry
                    .synchronizer()
                    .synchronize(&session, SyncOptions::default())
                    .await
            })
        };
        while transport.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        let leaving = {
            let registry = registry.clone();
            let guild = guild.clone();
            tokio::spawn(async move { registry.leave(&guild).await })
        };
        tokio::task::yield_now().await;
        transport.release();

        assert_eq!(publishing.await.unwrap(), SyncOutcome::Published);
        assert!(leaving.await.unwrap());
        assert_eq!(transport.count(Op::Send), 1);
        assert_eq!(transport.count(Op::Delete), 1);
        assert!(transport.live_messages().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_all() {
        let (store, transport, registry) = setup();
        for g in ["a", "b", "c"] {
            let guild = GuildId::from(g);
            store.update(guild.clone(), playing(0));
            let session = registry.get_or_create(&guild, &ChannelId::from(g));
            registry
                .synchronizer()
                .synchronize(&session, SyncOptions::default())
                .await;
        }
        assert_eq!(transport.live_messages().len(), 3);

        registry.shutdown_all().await;
        assert!(registry.is_empty());
        assert!(transport.live_messages().is_empty());
    }
}
