use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{ApiError, types::GuildId},
    server::AppState,
};

/// DELETE /v1/guilds/{guildId}
pub async fn destroy_session(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("[{}] DELETE session", guild_id);

    if state.registry.leave(&guild_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        ApiError::not_found(
            "No playback session for this guild",
            format!("/v1/guilds/{}", guild_id),
        )
        .into_response()
    }
}
