//! State shared by every interactive prompt: who may press its buttons and until when

use std::time::Duration;
use tokio::time::Instant;

/// Reply sent privately to anyone but the owner
pub const REJECTION_NOTICE: &str = "You can't do that.";

/// One live prompt bound to a single user
#[derive(Debug, Clone)]
pub struct WidgetSession {
    owner_id: String,
    timeout: Duration,
    deadline: Instant,
}

impl WidgetSession {
    pub fn new(owner_id: impl Into<String>, timeout: Duration, now: Instant) -> Self {
        Self {
            owner_id: owner_id.into(),
            timeout,
            deadline: now + timeout,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// The timeout counts inactivity: every accepted interaction restarts it.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = now + self.timeout;
    }
}

/// What an interaction did to a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Pressed by someone other than the owner; nothing changed.
    Unauthorized,
    /// The widget already finished or the button is unknown; nothing changed.
    Ignored,
    Applied(T),
}
