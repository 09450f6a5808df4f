use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::synchronizer::{SyncOptions, Synchronizer};
use crate::server::session::PlaybackSession;

/// Spawns the periodic refresh for one session.
///
/// The task holds only a weak reference, so it never keeps a destroyed
/// session alive, and it exits as soon as `cancel` fires.
pub fn spawn_refresh_ticker(
    session: Weak<PlaybackSession>,
    synchronizer: Arc<Synchronizer>,
    every: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        // A slow transport must not cause a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let Some(session) = session.upgrade() else {
                break;
            };
            if session.is_closed() {
                break;
            }
            synchronizer
                .synchronize(&session, SyncOptions::default())
                .await;
        }

        debug!("refresh ticker stopped");
    })
}
