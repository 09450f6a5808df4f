use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{ApiError, types::GuildId},
    controls::{SyncOptions, SyncOutcome},
    server::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRequest {
    pub force: bool,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// False when another update was in flight and this one was dropped.
    pub ran: bool,
    pub outcome: SyncOutcome,
}

/// POST /v1/guilds/{guildId}/refresh
pub async fn refresh_controls(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> impl IntoResponse {
    tracing::info!("[{}] POST refresh (force: {})", guild_id, body.force);

    let Some(session) = state.registry.get(&guild_id) else {
        return ApiError::not_found(
            "No playback session for this guild",
            format!("/v1/guilds/{}/refresh", guild_id),
        )
        .into_response();
    };

    let options = SyncOptions {
        force: body.force,
        override_text: body.text,
    };
    let outcome = state
        .registry
        .synchronizer()
        .synchronize(&session, options)
        .await;

    (
        StatusCode::OK,
        Json(RefreshResponse {
            ran: outcome != SyncOutcome::Coalesced,
            outcome,
        }),
    )
        .into_response()
}
