use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::embed::Embed;

/// Containers allowed in one message.
pub const MESSAGE_EMBED_LIMIT: usize = 10;
/// Aggregate text allowed across one message's containers.
pub const MESSAGE_TEXT_LIMIT: usize = 6000;

/// A message: an ordered bundle of embeds plus message-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

impl Message {
    pub fn text_len(&self) -> usize {
        self.embeds.iter().map(Embed::text_len).sum()
    }
}
