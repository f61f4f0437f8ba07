//! In-memory adapter that records every outbound call, used by tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use crate::application::errors::BotError;
use crate::domain::entities::Interaction;
use crate::domain::traits::{Bot, BotInfo, OutgoingMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel_id: String, message_id: String, message: OutgoingMessage },
    Edit { channel_id: String, message_id: String, message: OutgoingMessage },
    Delete { channel_id: String, message_id: String },
    Ephemeral { user_id: String, text: String },
}

#[derive(Default)]
pub struct RecordingBot {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    refuse_replies: AtomicBool,
}

impl RecordingBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send carrying `reply_to` fail
    pub fn refuse_replies(&self) {
        self.refuse_replies.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Id of the most recent message sent
    pub fn last_sent_id(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Send { message_id, .. } => Some(message_id),
            _ => None,
        })
    }

    pub fn edits(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn ephemerals(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ephemeral { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn send_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<String, BotError> {
        if message.reply_to.is_some() && self.refuse_replies.load(Ordering::SeqCst) {
            return Err(BotError::Network("unknown message".to_string()));
        }
        let message_id = format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(Call::Send {
            channel_id: channel_id.to_string(),
            message_id: message_id.clone(),
            message,
        });
        Ok(message_id)
    }

    async fn edit_message(&self, channel_id: &str, message_id: &str, message: OutgoingMessage) -> Result<(), BotError> {
        self.record(Call::Edit {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            message,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        self.record(Call::Delete {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn respond_ephemeral(&self, interaction: &Interaction, text: &str) -> Result<(), BotError> {
        self.record(Call::Ephemeral {
            user_id: interaction.user.id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "999".to_string(),
            name: "rick-bot".to_string(),
            username: "rick".to_string(),
        }
    }
}
