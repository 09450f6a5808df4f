use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::{
  common::{banner::BuildInfo, types::now_ms},
  server::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
  pub branch: String,
  pub commit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
  pub version: String,
  pub build_time: u64,
  pub git: GitInfo,
  pub profile: String,
  pub sessions: usize,
  /// Milliseconds since the service started.
  pub uptime: u64,
}

/// GET /version
pub async fn get_version(State(state): State<Arc<AppState>>) -> Json<VersionInfo> {
  tracing::debug!("GET /version");
  let build = BuildInfo::default();

  Json(VersionInfo {
    version: build.version.to_string(),
    build_time: build.build_time,
    git: GitInfo {
      branch: build.branch.to_string(),
      commit: build.commit.to_string(),
    },
    profile: build.profile.to_string(),
    sessions: state.registry.len(),
    uptime: now_ms().saturating_sub(state.started_at),
  })
}
