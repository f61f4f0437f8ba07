use async_trait::async_trait;
use crate::domain::entities::{Embed, Interaction};
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot and begin listening for messages
    async fn start(&self) -> Result<(), BotError>;

    /// Send a message to a channel, returning the new message id
    async fn send_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<String, BotError>;

    /// Replace the body and controls of a message the bot sent earlier
    async fn edit_message(&self, channel_id: &str, message_id: &str, message: OutgoingMessage) -> Result<(), BotError>;

    /// Delete a message
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError>;

    /// Answer an interaction with a notice only the pressing user can see
    async fn respond_ephemeral(&self, interaction: &Interaction, text: &str) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Visual style of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Success,
    Danger,
}

/// Keyboard button for inline keyboards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub label: String,
    pub custom_id: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl KeyboardButton {
    pub fn new(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            custom_id: custom_id.into(),
            style: ButtonStyle::Primary,
            disabled: false,
        }
    }

    pub fn with_style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Everything needed to render one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub components: Vec<Vec<KeyboardButton>>,
    /// Message id this one replies to.
    pub reply_to: Option<String>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: Vec<Vec<KeyboardButton>>) -> Self {
        self.components = components;
        self
    }

    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
