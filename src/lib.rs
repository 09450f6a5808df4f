pub mod common;
pub mod configs;
pub mod controls;
pub mod messaging;
pub mod playback;
pub mod server;
pub mod transport;
