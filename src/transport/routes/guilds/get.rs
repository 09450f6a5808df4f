use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::{
    common::types::{ChannelId, GuildId},
    messaging::MessageHandle,
    server::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    /// Unknown while an update is in flight.
    pub control_message: Option<MessageHandle>,
    pub updating: bool,
    pub created_at: u64,
}

/// GET /v1/sessions
pub async fn get_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionInfo>> {
    tracing::debug!("GET /v1/sessions");

    // A stalled transport call holds its session's gate, so never wait on it.
    let mut sessions: Vec<SessionInfo> = state
        .registry
        .sessions()
        .iter()
        .map(|session| {
            let (control_message, updating) = match session.gate().try_enter() {
                Some(slot) => (slot.message.clone(), false),
                None => (None, true),
            };
            SessionInfo {
                guild_id: session.guild_id().clone(),
                channel_id: session.channel_id().clone(),
                control_message,
                updating,
                created_at: session.created_at(),
            }
        })
        .collect();
    sessions.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
    Json(sessions)
}
