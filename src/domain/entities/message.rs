use super::User;
use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command { .. })
    }
}

/// An inbound chat message as delivered by the gateway
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// Server the message was posted in; `None` for direct messages.
    pub guild_id: Option<String>,
    /// Set when the message was posted through a webhook.
    pub webhook_id: Option<String>,
    pub sender: User,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(channel_id: impl Into<String>, sender: User, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            guild_id: None,
            webhook_id: None,
            sender,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(channel_id: impl Into<String>, sender: User, text: impl Into<String>) -> Self {
        Self::new(channel_id, sender, Content::Text(text.into()))
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_webhook(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }

    pub fn unix(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
