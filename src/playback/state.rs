use serde::{Deserialize, Serialize};

use crate::controls::duration;

/// Accepts a duration either as milliseconds or as a `H:MM:SS` display string.
pub fn deserialize_duration_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: serde_json::Value = serde::Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a non-negative duration")),
        // Unparseable strings degrade to "untimed" rather than failing the snapshot.
        serde_json::Value::String(s) => Ok(Some(duration::parse(&s)).filter(|ms| *ms > 0)),
        _ => Err(serde::de::Error::custom("expected number, string or null")),
    }
}

/// A queued or playing track as reported by the playback engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// `None` for live or otherwise untimed content.
    #[serde(default, deserialize_with = "deserialize_duration_ms")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn requested_by(mut self, user: impl Into<String>) -> Self {
        self.requested_by = Some(user.into());
        self
    }

    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    /// Markdown link to the track, or the bare title when it has no url.
    pub fn markdown_link(&self) -> String {
        match &self.url {
            Some(url) => format!("[{}]({})", self.title, url),
            None => self.title.clone(),
        }
    }
}

/// Point-in-time view of one guild's queue, pushed by the playback engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    #[serde(default)]
    pub current: Option<Track>,
    /// Tracks after the current one, in play order.
    #[serde(default)]
    pub upcoming: Vec<Track>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub position_ms: u64,
}

impl QueueSnapshot {
    pub fn next(&self) -> Option<&Track> {
        self.upcoming.first()
    }

    pub fn queue_size(&self) -> usize {
        self.upcoming.len()
    }

    /// Duration of the current track, 0 when nothing is playing or it is untimed.
    pub fn track_duration_ms(&self) -> u64 {
        self.current
            .as_ref()
            .and_then(|t| t.duration_ms)
            .unwrap_or(0)
    }

    /// Playback position, never past the end of the current track.
    pub fn clamped_position_ms(&self) -> u64 {
        match self.track_duration_ms() {
            0 => self.position_ms,
            total => self.position_ms.min(total),
        }
    }
}
