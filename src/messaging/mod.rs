//! Outbound side: publishing the control message to the chat platform.

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    common::{
        TransportError,
        types::{ChannelId, MessageId},
    },
    controls::render::Payload,
};

pub mod discord;
pub mod memory;

pub use discord::DiscordTransport;
pub use memory::MemoryTransport;

/// Reference to a message that has been published.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHandle {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageHandle {
    pub fn new(channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(
        &self,
        channel_id: &ChannelId,
        payload: &Payload,
    ) -> Result<MessageHandle, TransportError>;

    async fn edit_message(
        &self,
        handle: &MessageHandle,
        payload: &Payload,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError>;
}
