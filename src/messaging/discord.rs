use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{MessageHandle, MessageTransport};
use crate::{
    common::{
        TransportError,
        types::{AnyResult, ChannelId, MessageId},
    },
    configs::DiscordConfig,
    controls::render::{ButtonStyle, Payload},
};

// Discord rejects embeds that exceed these.
const MAX_TITLE_CHARS: usize = 256;
const MAX_FIELD_NAME_CHARS: usize = 256;
const MAX_FIELD_VALUE_CHARS: usize = 1024;
const MAX_CONTENT_CHARS: usize = 2000;

const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;

/// Publishes control messages through the Discord REST API.
pub struct DiscordTransport {
    client: reqwest::Client,
    api_base: String,
    authorization: String,
}

#[derive(Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

impl DiscordTransport {
    pub fn new(config: &DiscordConfig) -> AnyResult<Self> {
        let token = config
            .resolved_token()
            .ok_or("discord.token is empty and DISCORD_TOKEN is not set")?;

        let client = reqwest::Client::builder()
            .user_agent(format!(
                "DiscordBot (https://github.com/stagehand-bot/stagehand, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            authorization: format!("Bot {}", token),
        })
    }

    fn messages_url(&self, channel_id: &ChannelId) -> String {
        format!("{}/channels/{}/messages", self.api_base, channel_id)
    }

    fn message_url(&self, handle: &MessageHandle) -> String {
        format!(
            "{}/channels/{}/messages/{}",
            self.api_base, handle.channel_id, handle.message_id
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            404 => Err(TransportError::NotFound),
            429 => {
                let retry_after_ms = response
                    .json::<RateLimitBody>()
                    .await
                    .map(|b| (b.retry_after * 1000.0) as u64)
                    .unwrap_or(1000);
                Err(TransportError::RateLimited { retry_after_ms })
            }
            code => Err(TransportError::Status {
                status: code,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl MessageTransport for DiscordTransport {
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        payload: &Payload,
    ) -> Result<MessageHandle, TransportError> {
        let response = self
            .client
            .post(self.messages_url(channel_id))
            .header("Authorization", &self.authorization)
            .json(&to_discord_json(payload))
            .send()
            .await?;

        let created: CreatedMessage = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        debug!("sent control message {} to channel {}", created.id, channel_id);
        Ok(MessageHandle::new(channel_id.clone(), MessageId(created.id)))
    }

    async fn edit_message(
        &self,
        handle: &MessageHandle,
        payload: &Payload,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .patch(self.message_url(handle))
            .header("Authorization", &self.authorization)
            .json(&to_discord_json(payload))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError> {
        let response = self
            .client
            .delete(self.message_url(handle))
            .header("Authorization", &self.authorization)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Discord message body for `payload`.
///
/// `content` is always present so that an edit without override text clears
/// whatever transient text the previous render carried.
pub fn to_discord_json(payload: &Payload) -> Value {
    let fields: Vec<Value> = payload
        .embed
        .fields
        .iter()
        .map(|f| {
            json!({
                "name": truncate(&f.name, MAX_FIELD_NAME_CHARS),
                "value": truncate(&f.value, MAX_FIELD_VALUE_CHARS),
                "inline": false,
            })
        })
        .collect();

    let mut embed = json!({
        "title": truncate(&payload.embed.title, MAX_TITLE_CHARS),
        "fields": fields,
    });
    if let Some(url) = &payload.embed.thumbnail_url {
        embed["thumbnail"] = json!({ "url": url });
    }

    let components: Vec<Value> = payload
        .components
        .iter()
        .map(|row| {
            let buttons: Vec<Value> = row
                .buttons
                .iter()
                .map(|b| {
                    json!({
                        "type": COMPONENT_BUTTON,
                        "style": match b.style {
                            ButtonStyle::Primary => 1,
                            ButtonStyle::Danger => 4,
                        },
                        "label": b.label,
                        "emoji": { "name": b.emoji },
                        "custom_id": b.custom_id,
                        "disabled": b.disabled,
                    })
                })
                .collect();
            json!({ "type": COMPONENT_ACTION_ROW, "components": buttons })
        })
        .collect();

    json!({
        "content": truncate(payload.content.as_deref().unwrap_or(""), MAX_CONTENT_CHARS),
        "embeds": [embed],
        "components": components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controls::render::ControlRenderer,
        playback::{QueueSnapshot, Track},
    };

    fn payload(text: Option<&str>) -> Payload {
        let snapshot = QueueSnapshot {
            current: Some(
                Track::new("Song")
                    .with_url("https://x.test/song")
                    .with_duration_ms(180_000)
                    .with_artwork("https://x.test/art.jpg"),
            ),
            is_playing: true,
            is_ready: true,
            position_ms: 60_000,
            ..QueueSnapshot::default()
        };
        ControlRenderer::default().render(&snapshot, text).unwrap()
    }

    #[test]
    fn test_discord_json_layout() {
        let body = to_discord_json(&payload(None));

        assert_eq!(body["content"], "");
        assert_eq!(body["embeds"][0]["title"], "Music Controls");
        assert_eq!(body["embeds"][0]["thumbnail"]["url"], "https://x.test/art.jpg");
        assert_eq!(body["embeds"][0]["fields"].as_array().unwrap().len(), 3);

        let rows = body["components"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["type"], 1);
        assert_eq!(rows[0]["components"][0]["custom_id"], "btn-leave");
        assert_eq!(rows[0]["components"][0]["style"], 4);
        assert_eq!(rows[0]["components"][1]["style"], 1);
        assert_eq!(rows[1]["components"][2]["custom_id"], "btn-controls");
    }

    #[test]
    fn test_override_text_is_sent_as_content() {
        let body = to_discord_json(&payload(Some("Error: disk full")));
        assert_eq!(body["content"], "Error: disk full");
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = "a".repeat(3000);
        let out = truncate(&long, MAX_FIELD_VALUE_CHARS);
        assert_eq!(out.chars().count(), MAX_FIELD_VALUE_CHARS);
        assert!(out.ends_with('…'));
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_missing_token_is_an_error() {
        // SAFETY: no other test in this binary reads DISCORD_TOKEN.
        unsafe { std::env::remove_var("DISCORD_TOKEN") };
        let config = DiscordConfig::default();
        assert!(DiscordTransport::new(&config).is_err());
    }

    #[test]
    fn test_urls() {
        let config = DiscordConfig {
            token: "abc".into(),
            api_base: "http://localhost:1234/api/".into(),
        };
        let transport = DiscordTransport::new(&config).unwrap();
        let handle = MessageHandle::new(ChannelId::from("10"), MessageId::from("20"));
        assert_eq!(
            transport.messages_url(&ChannelId::from("10")),
            "http://localhost:1234/api/channels/10/messages"
        );
        assert_eq!(
            transport.message_url(&handle),
            "http://localhost:1234/api/channels/10/messages/20"
        );
    }
}
