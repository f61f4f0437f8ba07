//! Yes/No confirmation prompt

use std::time::Duration;
use tokio::time::Instant;
use crate::application::errors::WidgetError;
use crate::domain::traits::{ButtonStyle, KeyboardButton, OutgoingMessage};
use super::manager::WidgetTarget;
use super::session::{Outcome, WidgetSession, REJECTION_NOTICE};

const YES_ID: &str = "confirm:yes";
const NO_ID: &str = "confirm:no";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmState {
    Pending,
    Accepted,
    Declined,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Accept,
    Decline,
}

impl ConfirmAction {
    pub fn from_custom_id(id: &str) -> Option<Self> {
        match id {
            YES_ID => Some(ConfirmAction::Accept),
            NO_ID => Some(ConfirmAction::Decline),
            _ => None,
        }
    }
}

/// `pending → {accepted, declined, expired}`
#[derive(Debug, Clone)]
pub struct Confirm {
    session: WidgetSession,
    state: ConfirmState,
}

impl Confirm {
    pub fn new(owner_id: impl Into<String>, timeout: Duration, now: Instant) -> Self {
        Self {
            session: WidgetSession::new(owner_id, timeout, now),
            state: ConfirmState::Pending,
        }
    }

    pub fn state(&self) -> ConfirmState {
        self.state
    }

    pub fn session(&self) -> &WidgetSession {
        &self.session
    }

    /// `Some(true)` when accepted, `Some(false)` when declined, `None` otherwise
    pub fn value(&self) -> Option<bool> {
        match self.state {
            ConfirmState::Accepted => Some(true),
            ConfirmState::Declined => Some(false),
            ConfirmState::Pending | ConfirmState::Expired => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state != ConfirmState::Pending
    }

    pub fn handle(&mut self, user_id: &str, action: ConfirmAction, now: Instant) -> Outcome<ConfirmState> {
        if self.expire(now) || self.is_terminal() {
            return Outcome::Ignored;
        }
        if !self.session.is_owner(user_id) {
            return Outcome::Unauthorized;
        }

        self.state = match action {
            ConfirmAction::Accept => ConfirmState::Accepted,
            ConfirmAction::Decline => ConfirmState::Declined,
        };
        Outcome::Applied(self.state)
    }

    /// Move a pending prompt past its deadline to `Expired`. Returns true if it expired now.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.state == ConfirmState::Pending && self.session.is_expired(now) {
            self.state = ConfirmState::Expired;
            return true;
        }
        false
    }

    /// The two buttons, disabled once the prompt is finished
    pub fn components(&self) -> Vec<Vec<KeyboardButton>> {
        let mut yes = KeyboardButton::new("Yes", YES_ID).with_style(ButtonStyle::Success);
        let mut no = KeyboardButton::new("No", NO_ID).with_style(ButtonStyle::Danger);
        if self.is_terminal() {
            yes = yes.disabled();
            no = no.disabled();
        }
        vec![vec![yes, no]]
    }
}

/// Options for [`run_confirm`]
#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    pub timeout: Duration,
    pub delete_after: bool,
}

/// Render a prompt, wait for the owner to answer, and return the answer.
///
/// Returns `Ok(None)` when the prompt expired.
pub async fn run_confirm(target: &WidgetTarget, content: &str, options: ConfirmOptions) -> Result<Option<bool>, WidgetError> {
    let mut confirm = Confirm::new(target.owner_id.clone(), options.timeout, Instant::now());

    let message_id = target
        .send(OutgoingMessage::text(content).with_components(confirm.components()))
        .await?;
    let mut events = target.manager.attach(&message_id);

    while !confirm.is_terminal() {
        let interaction = match tokio::time::timeout_at(confirm.session().deadline(), events.recv()).await {
            Ok(Some(interaction)) => interaction,
            Ok(None) | Err(_) => {
                confirm.expire(Instant::now());
                break;
            }
        };

        let Some(action) = ConfirmAction::from_custom_id(&interaction.custom_id) else {
            continue;
        };

        if confirm.handle(&interaction.user.id, action, Instant::now()) == Outcome::Unauthorized {
            tracing::debug!(user = %interaction.user.id, message = %message_id, "rejected confirm interaction");
            if let Err(e) = target.bot.respond_ephemeral(&interaction, REJECTION_NOTICE).await {
                tracing::warn!("Failed to send rejection notice: {}", e);
            }
        }
    }

    // Pending here means the deadline passed while nothing arrived.
    if confirm.state() == ConfirmState::Pending {
        confirm.expire(confirm.session().deadline());
    }
    target.manager.detach(&message_id);

    if options.delete_after {
        target.bot.delete_message(&target.channel_id, &message_id).await?;
    } else {
        target
            .bot
            .edit_message(
                &target.channel_id,
                &message_id,
                OutgoingMessage::text(content).with_components(confirm.components()),
            )
            .await?;
    }

    Ok(confirm.value())
}
