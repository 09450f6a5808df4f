use serde::Serialize;

use super::progress::{self, DEFAULT_GLYPHS, ProgressGlyphs};
use crate::{configs::ControlsConfig, playback::QueueSnapshot};

pub const NOW_PLAYING: &str = "Now Playing";
pub const NEXT_SONG: &str = "Next Song";
pub const NO_UPCOMING_SONG: &str = "No upcoming song";

/// Custom ids carried by the control buttons. Interaction handlers outside
/// this crate match on them.
pub mod button_ids {
    pub const STOP: &str = "btn-leave";
    pub const PAUSE: &str = "btn-pause";
    pub const NEXT: &str = "btn-next";
    pub const QUEUE: &str = "btn-queue";
    pub const SHUFFLE: &str = "btn-mix";
    pub const REFRESH: &str = "btn-controls";
}

/// Everything needed to draw the control message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Transient text shown above the embed.
    pub content: Option<String>,
    pub embed: Embed,
    pub components: Vec<ActionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Embed {
    pub title: String,
    pub fields: Vec<EmbedField>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub custom_id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    fn primary(custom_id: &'static str, label: &'static str, emoji: &'static str) -> Self {
        Self {
            custom_id,
            label,
            emoji,
            style: ButtonStyle::Primary,
            disabled: false,
        }
    }

    fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Builds control message payloads from queue snapshots.
#[derive(Debug, Clone)]
pub struct ControlRenderer {
    title: String,
    progress_width: usize,
    glyphs: ProgressGlyphs,
}

impl Default for ControlRenderer {
    fn default() -> Self {
        Self::new(&ControlsConfig::default())
    }
}

impl ControlRenderer {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            title: config.title.clone(),
            progress_width: config.progress_width,
            glyphs: DEFAULT_GLYPHS,
        }
    }

    /// Renders the card for `snapshot`. Returns `None` when nothing is
    /// playing, since there is nothing to show.
    pub fn render(&self, snapshot: &QueueSnapshot, override_text: Option<&str>) -> Option<Payload> {
        let current = snapshot.current.as_ref()?;
        let mut fields = Vec::with_capacity(3);

        let queue_size = snapshot.queue_size();
        let heading = if queue_size > 2 {
            format!("{} (Total: {} tracks queued)", NOW_PLAYING, queue_size)
        } else {
            NOW_PLAYING.to_string()
        };
        let mut now_playing = current.markdown_link();
        if let Some(user) = &current.requested_by {
            now_playing.push_str(&format!(" by {}", user));
        }
        fields.push(EmbedField::new(heading, now_playing));

        if let Some(bar) = progress::render(
            snapshot.clamped_position_ms(),
            snapshot.track_duration_ms(),
            self.progress_width,
            snapshot.is_playing,
            &self.glyphs,
        ) {
            fields.push(EmbedField::new(bar.heading, bar.readout));
        }

        let next = snapshot
            .next()
            .map(|t| t.markdown_link())
            .unwrap_or_else(|| NO_UPCOMING_SONG.to_string());
        fields.push(EmbedField::new(NEXT_SONG, next));

        Some(Payload {
            content: override_text.map(str::to_string),
            embed: Embed {
                title: self.title.clone(),
                fields,
                thumbnail_url: current.artwork_url.clone(),
            },
            components: controls(snapshot.is_playing),
        })
    }
}

fn controls(is_playing: bool) -> Vec<ActionRow> {
    let stop = Button {
        style: ButtonStyle::Danger,
        ..Button::primary(button_ids::STOP, "Stop", "⏹️")
    };
    let pause = if is_playing {
        Button::primary(button_ids::PAUSE, "Pause", "⏸️")
    } else {
        Button::primary(button_ids::PAUSE, "Resume", "▶️")
    };
    let next = Button::primary(button_ids::NEXT, "Next", "⏭").disabled(!is_playing);

    let queue = Button::primary(button_ids::QUEUE, "Queue", "🎵");
    let shuffle = Button::primary(button_ids::SHUFFLE, "Shuffle", "🎛️").disabled(!is_playing);
    let refresh = Button::primary(button_ids::REFRESH, "Refresh", "🔄");

    vec![
        ActionRow {
            buttons: vec![stop, pause, next],
        },
        ActionRow {
            buttons: vec![queue, shuffle, refresh],
        },
    ]
}
