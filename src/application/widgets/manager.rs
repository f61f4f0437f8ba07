//! Routes button presses to the widget listening on the pressed message

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use crate::application::errors::WidgetError;
use crate::domain::entities::Interaction;
use crate::domain::traits::{Bot, OutgoingMessage};

const CHANNEL_CAPACITY: usize = 16;

/// Live widgets keyed by the id of the message they rendered
#[derive(Default)]
pub struct WidgetManager {
    live: Mutex<HashMap<String, mpsc::Sender<Interaction>>>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start receiving interactions aimed at `message_id`
    pub fn attach(&self, message_id: &str) -> mpsc::Receiver<Interaction> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if let Ok(mut live) = self.live.lock() {
            live.insert(message_id.to_string(), tx);
        }
        rx
    }

    pub fn detach(&self, message_id: &str) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(message_id);
        }
    }

    /// Hand an interaction to its widget. Returns false when no widget owns the message.
    pub fn route(&self, interaction: Interaction) -> bool {
        let sender = match self.live.lock() {
            Ok(live) => live.get(&interaction.message_id).cloned(),
            Err(_) => None,
        };

        match sender {
            Some(tx) => match tx.try_send(interaction) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(dropped)) => {
                    tracing::warn!(message = %dropped.message_id, "widget is busy, dropping interaction");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
            None => false,
        }
    }

    /// Number of widgets still waiting for input
    pub fn live(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

/// Where a widget renders and who owns it
#[derive(Clone)]
pub struct WidgetTarget {
    pub bot: Arc<dyn Bot>,
    pub manager: Arc<WidgetManager>,
    pub channel_id: String,
    pub reply_to: Option<String>,
    pub owner_id: String,
}

impl WidgetTarget {
    pub async fn send(&self, message: OutgoingMessage) -> Result<String, WidgetError> {
        let message = match &self.reply_to {
            Some(id) if message.reply_to.is_none() => message.replying_to(id.clone()),
            _ => message,
        };
        Ok(self.bot.send_message(&self.channel_id, message).await?)
    }
}
