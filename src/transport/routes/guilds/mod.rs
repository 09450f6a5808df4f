pub mod destroy;
pub mod events;
pub mod get;
pub mod queue;
pub mod refresh;

pub use destroy::destroy_session;
pub use events::post_events;
pub use get::get_sessions;
pub use queue::get_queue;
pub use refresh::refresh_controls;
