//! Console adapter for development/testing
//!
//! Every stdin line becomes a message from the console user. A line of the form
//! `click <message-id> <button-id>` presses a button on a rendered widget instead.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use crate::application::errors::BotError;
use crate::domain::entities::{GatewayEvent, Interaction, Message, User};
use crate::domain::traits::{Bot, BotInfo, ButtonStyle, OutgoingMessage};

const CHANNEL_ID: &str = "console";

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    user: User,
    guild: Option<String>,
    next_id: AtomicU64,
}

impl ConsoleAdapter {
    pub fn new(user_id: impl Into<String>, guild: Option<String>) -> Self {
        Self {
            info: BotInfo {
                id: "0".to_string(),
                name: "rick-bot".to_string(),
                username: "console".to_string(),
            },
            user: User::new(user_id).with_username("you"),
            guild,
            next_id: AtomicU64::new(1),
        }
    }

    /// Turn one input line into a gateway event
    pub fn parse_line(&self, line: &str) -> Option<GatewayEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut parts = line.split_whitespace();
        if parts.next() == Some("click") {
            if let (Some(message_id), Some(button), None) = (parts.next(), parts.next(), parts.next()) {
                return Some(GatewayEvent::Interaction(Interaction::new(
                    self.user.clone(),
                    CHANNEL_ID,
                    message_id,
                    button,
                )));
            }
        }

        let mut message = Message::from_text(CHANNEL_ID, self.user.clone(), line);
        if let Some(guild) = &self.guild {
            message = message.in_guild(guild.clone());
        }
        Some(GatewayEvent::Message(message))
    }

    /// Read stdin until EOF, forwarding events. Returns when stdin closes or the receiver is gone.
    pub async fn read_events(&self, events: mpsc::Sender<GatewayEvent>) -> Result<(), BotError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(event) = self.parse_line(&line) {
                if events.send(event).await.is_err() {
                    break;
                }
            }
        }
        tracing::info!("Console input closed");
        Ok(())
    }

    fn print(&self, verb: &str, message_id: &str, message: &OutgoingMessage) {
        if let Some(content) = &message.content {
            println!("[BOT {} {}] {}", verb, message_id, content);
        }
        if let Some(embed) = &message.embed {
            if let Some(title) = &embed.title {
                println!("  == {} ==", title);
            }
            if let Some(description) = &embed.description {
                println!("  {}", description);
            }
            for field in &embed.fields {
                println!("  {}: {}", field.name, field.value);
            }
            if let Some(footer) = &embed.footer {
                println!("  -- {}", footer);
            }
        }
        for row in &message.components {
            let labels: Vec<String> = row
                .iter()
                .map(|b| {
                    let marker = match b.style {
                        ButtonStyle::Success => "+",
                        ButtonStyle::Danger => "!",
                        ButtonStyle::Primary => "",
                    };
                    let state = if b.disabled { " (disabled)" } else { "" };
                    format!("{}{} <{}>{}", marker, b.label, b.custom_id, state)
                })
                .collect();
            println!("  [Buttons] {}", labels.join(" | "));
        }
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, _channel_id: &str, message: OutgoingMessage) -> Result<String, BotError> {
        let id = format!("c{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.print("sent", &id, &message);
        Ok(id)
    }

    async fn edit_message(&self, _channel_id: &str, message_id: &str, message: OutgoingMessage) -> Result<(), BotError> {
        self.print("edited", message_id, &message);
        Ok(())
    }

    async fn delete_message(&self, _channel_id: &str, message_id: &str) -> Result<(), BotError> {
        println!("[BOT deleted {}]", message_id);
        Ok(())
    }

    async fn respond_ephemeral(&self, interaction: &Interaction, text: &str) -> Result<(), BotError> {
        println!("[BOT to {} only] {}", interaction.user.id, text);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_line_is_an_interaction() {
        let adapter = ConsoleAdapter::new("42", Some("console".to_string()));
        match adapter.parse_line("click c3 page:next") {
            Some(GatewayEvent::Interaction(i)) => {
                assert_eq!(i.message_id, "c3");
                assert_eq!(i.custom_id, "page:next");
                assert_eq!(i.user.id, "42");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_other_lines_are_guild_messages() {
        let adapter = ConsoleAdapter::new("42", Some("console".to_string()));
        match adapter.parse_line("!help install") {
            Some(GatewayEvent::Message(m)) => {
                assert_eq!(m.content.text(), Some("!help install"));
                assert!(!m.is_direct());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(adapter.parse_line("   ").is_none());
    }
}
