//! Inbound side: the HTTP API the player process and operators talk to.

pub mod http_server;
pub mod middleware;
pub mod routes;
