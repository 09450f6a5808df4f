use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    common::types::{ChannelId, GuildId},
    controls::RoutedEvent,
    playback::{PlayerEvent, QueueSnapshot},
    server::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Where the control message lives. Only read when the session is new.
    pub channel_id: ChannelId,
    pub state: QueueSnapshot,
    #[serde(default)]
    pub event: Option<PlayerEvent>,
}

/// POST /v1/guilds/{guildId}/events
///
/// Records the queue state, opens the session on first sight and hands the
/// event to the router. The sync pass runs after this returns.
pub async fn post_events(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<EventRequest>,
) -> StatusCode {
    debug!(
        "[{}] POST events: {:?}",
        guild_id,
        body.event.as_ref().map(PlayerEvent::kind)
    );

    let revision = state.store.update(guild_id.clone(), body.state);
    state.registry.get_or_create(&guild_id, &body.channel_id);

    if let Some(event) = body.event {
        if state
            .events
            .send(RoutedEvent {
                guild_id: guild_id.clone(),
                event,
                revision: Some(revision),
            })
            .is_err()
        {
            warn!("[{}] session router is gone, event dropped", guild_id);
        }
    }

    StatusCode::NO_CONTENT
}
