pub mod base;
pub mod controls;
pub mod discord;
pub mod logging;
pub mod server;

pub use base::*;
pub use controls::*;
pub use discord::*;
pub use logging::*;
pub use server::*;
