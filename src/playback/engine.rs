use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::state::QueueSnapshot;
use crate::common::types::GuildId;

/// Read side of the external player: the controls never mutate playback,
/// they only look at it and, when a queue drains, ask it to leave.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Current state of the guild's queue, or `None` when it has no queue.
    async fn snapshot(&self, guild_id: &GuildId) -> Option<QueueSnapshot>;

    /// Monotonic revision of the guild's queue state, if the engine tracks
    /// one. Events carry the revision they were reported with.
    fn revision(&self, _guild_id: &GuildId) -> Option<u64> {
        None
    }

    /// Release the guild's playback resources. With `seen`, only if nothing
    /// newer than that revision has been reported since.
    async fn leave(&self, guild_id: &GuildId, seen: Option<u64>);
}

/// True when the engine holds state newer than `seen`.
pub fn is_superseded(engine: &dyn PlaybackEngine, guild_id: &GuildId, seen: Option<u64>) -> bool {
    matches!((seen, engine.revision(guild_id)), (Some(seen), Some(latest)) if latest > seen)
}

struct Stored {
    revision: u64,
    snapshot: QueueSnapshot,
}

/// Engine adapter for a player running in another process, which pushes the
/// latest state of each queue alongside its lifecycle events.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: DashMap<GuildId, Stored>,
    next_revision: AtomicU64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot` and returns the revision it was stamped with.
    pub fn update(&self, guild_id: GuildId, snapshot: QueueSnapshot) -> u64 {
        let revision = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshots.insert(guild_id, Stored { revision, snapshot });
        revision
    }

    pub fn get(&self, guild_id: &GuildId) -> Option<QueueSnapshot> {
        self.snapshots.get(guild_id).map(|s| s.snapshot.clone())
    }
}

#[async_trait]
impl PlaybackEngine for SnapshotStore {
    async fn snapshot(&self, guild_id: &GuildId) -> Option<QueueSnapshot> {
        self.get(guild_id)
    }

    fn revision(&self, guild_id: &GuildId) -> Option<u64> {
        self.snapshots.get(guild_id).map(|s| s.revision)
    }

    async fn leave(&self, guild_id: &GuildId, seen: Option<u64>) {
        let removed = self
            .snapshots
            .remove_if(guild_id, |_, stored| seen.is_none_or(|seen| stored.revision <= seen));
        if removed.is_some() {
            debug!("[{}] dropped stored queue snapshot", guild_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::Track;

    #[tokio::test]
    async fn test_store_update_and_leave() {
        let store = SnapshotStore::new();
        let guild = GuildId::from("1");
        assert!(store.snapshot(&guild).await.is_none());

        store.update(
            guild.clone(),
            QueueSnapshot {
                current: Some(Track::new("a")),
                is_ready: true,
                ..QueueSnapshot::default()
            },
        );
        let snap = store.snapshot(&guild).await.unwrap();
        assert_eq!(snap.current.unwrap().title, "a");

        store.leave(&guild, None).await;
        assert!(store.snapshot(&guild).await.is_none());
    }

    #[tokio::test]
    async fn test_leave_keeps_newer_snapshot() {
        let store = SnapshotStore::new();
        let guild = GuildId::from("1");
        let old = store.update(guild.clone(), QueueSnapshot::default());
        let new = store.update(
            guild.clone(),
            QueueSnapshot {
                current: Some(Track::new("b")),
                is_ready: true,
                ..QueueSnapshot::default()
            },
        );
        assert!(new > old);
        assert!(is_superseded(&store, &guild, Some(old)));
        assert!(!is_superseded(&store, &guild, Some(new)));
        assert!(!is_superseded(&store, &guild, None));

        store.leave(&guild, Some(old)).await;
        assert_eq!(store.revision(&guild), Some(new));

        store.leave(&guild, Some(new)).await;
        assert!(store.snapshot(&guild).await.is_none());
        assert!(!is_superseded(&store, &guild, Some(old)));
    }
}
