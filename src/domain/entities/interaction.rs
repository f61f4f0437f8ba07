use super::User;

/// A button press on a message the bot rendered
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub user: User,
    pub channel_id: String,
    pub message_id: String,
    /// Identifier of the pressed button.
    pub custom_id: String,
}

impl Interaction {
    pub fn new(
        user: User,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
        custom_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user,
            channel_id: channel_id.into(),
            message_id: message_id.into(),
            custom_id: custom_id.into(),
        }
    }
}

/// Everything the gateway can hand to the dispatcher
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Message(super::Message),
    Interaction(Interaction),
}
