pub mod app_state;
pub mod registry;
pub mod session;

pub use app_state::AppState;
pub use registry::SessionRegistry;
pub use session::PlaybackSession;
