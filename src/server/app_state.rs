use std::sync::Arc;

use crate::{
    configs::Config,
    controls::{QueuePaginator, RoutedEvent},
    playback::SnapshotStore,
    server::SessionRegistry,
};

/// Top-level application state shared by every HTTP handler.
pub struct AppState {
    pub config: Config,
    pub registry: Arc<SessionRegistry>,
    /// Latest queue state pushed by the player process.
    pub store: Arc<SnapshotStore>,
    pub paginator: QueuePaginator,
    /// Feeds the session router.
    pub events: flume::Sender<RoutedEvent>,
    pub started_at: u64,
}
