use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{ApiError, types::GuildId},
    controls::{QueueView, paginator::QueuePage},
    server::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub page: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    /// Only the requester should see the reply.
    pub ephemeral: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<QueuePage>,
}

impl From<QueueView> for QueueResponse {
    fn from(view: QueueView) -> Self {
        let ephemeral = view.is_ephemeral();
        let content = view.text().to_string();
        let page = match view {
            QueueView::Paged(page) => Some(page),
            _ => None,
        };
        Self {
            ephemeral,
            content,
            page,
        }
    }
}

/// GET /v1/guilds/{guildId}/queue?page=N
pub async fn get_queue(
    Path(guild_id): Path<GuildId>,
    Query(query): Query<QueueQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::debug!("[{}] GET queue page {}", guild_id, query.page);

    if state.registry.get(&guild_id).is_none() {
        return ApiError::not_found(
            "No playback session for this guild",
            format!("/v1/guilds/{}/queue", guild_id),
        )
        .into_response();
    }

    let snapshot = state
        .registry
        .synchronizer()
        .engine()
        .snapshot(&guild_id)
        .await;
    let view = state.paginator.view(snapshot.as_ref(), query.page);
    Json(QueueResponse::from(view)).into_response()
}
