//! The control message: rendering, serialized updates and event routing.

pub mod duration;
pub mod gate;
pub mod paginator;
pub mod progress;
pub mod render;
pub mod router;
pub mod synchronizer;
pub mod ticker;

pub use gate::UpdateGate;
pub use paginator::{QueuePaginator, QueueView};
pub use render::{ControlRenderer, Payload};
pub use router::{RoutedEvent, SessionRouter};
pub use synchronizer::{SyncOptions, SyncOutcome, Synchronizer};
