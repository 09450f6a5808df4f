pub mod engine;
pub mod events;
pub mod state;

pub use engine::{PlaybackEngine, SnapshotStore, is_superseded};
pub use events::{EventKind, PlayerEvent};
pub use state::{QueueSnapshot, Track};
