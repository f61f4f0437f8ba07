//! Paginated view with previous / stop / next controls

use std::time::Duration;
use tokio::time::Instant;
use crate::application::errors::WidgetError;
use crate::domain::traits::{ButtonStyle, KeyboardButton, OutgoingMessage};
use super::manager::WidgetTarget;
use super::session::{Outcome, WidgetSession, REJECTION_NOTICE};
use super::source::PageSource;

const PREVIOUS_ID: &str = "page:previous";
const STOP_ID: &str = "page:stop";
const NEXT_ID: &str = "page:next";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
    Stop,
}

impl PageAction {
    pub fn from_custom_id(id: &str) -> Option<Self> {
        match id {
            PREVIOUS_ID => Some(PageAction::Previous),
            STOP_ID => Some(PageAction::Stop),
            NEXT_ID => Some(PageAction::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    Active,
    Stopped,
    Expired,
}

/// What the driver should do after an accepted interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTransition {
    /// Render this page, then [`Paginator::commit`] it.
    Show(usize),
    /// Delete the rendered message.
    Stop,
}

/// Page cursor of one paginated view
#[derive(Debug, Clone)]
pub struct Paginator {
    session: WidgetSession,
    current_page: usize,
    max_pages: Option<usize>,
    state: PaginatorState,
}

impl Paginator {
    pub fn new(owner_id: impl Into<String>, timeout: Duration, now: Instant, max_pages: Option<usize>) -> Self {
        Self {
            session: WidgetSession::new(owner_id, timeout, now),
            current_page: 0,
            max_pages,
            state: PaginatorState::Active,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    pub fn session(&self) -> &WidgetSession {
        &self.session
    }

    pub fn handle(&mut self, user_id: &str, action: PageAction, now: Instant) -> Outcome<PageTransition> {
        if self.expire(now) || self.state != PaginatorState::Active {
            return Outcome::Ignored;
        }
        if !self.session.is_owner(user_id) {
            return Outcome::Unauthorized;
        }

        self.session.touch(now);

        let requested = match action {
            PageAction::Stop => {
                self.state = PaginatorState::Stopped;
                return Outcome::Applied(PageTransition::Stop);
            }
            PageAction::Previous => self.current_page as isize - 1,
            PageAction::Next => self.current_page as isize + 1,
        };

        match self.checked_page(requested) {
            Some(page) => Outcome::Applied(PageTransition::Show(page)),
            None => Outcome::Ignored,
        }
    }

    /// Wrap below zero to the last page and past the end to the first.
    /// Without a known page count the request passes through unchecked.
    fn checked_page(&self, requested: isize) -> Option<usize> {
        match self.max_pages {
            None => usize::try_from(requested).ok(),
            Some(0) => None,
            Some(max) if requested < 0 => Some(max - 1),
            Some(max) if requested as usize >= max => Some(0),
            Some(_) => Some(requested as usize),
        }
    }

    /// Record that `page` is now on screen
    pub fn commit(&mut self, page: usize) {
        self.current_page = page;
    }

    pub fn expire(&mut self, now: Instant) -> bool {
        if self.state == PaginatorState::Active && self.session.is_expired(now) {
            self.state = PaginatorState::Expired;
            return true;
        }
        false
    }

    pub fn components(&self) -> Vec<Vec<KeyboardButton>> {
        vec![vec![
            KeyboardButton::new("previous", PREVIOUS_ID),
            KeyboardButton::new("stop", STOP_ID).with_style(ButtonStyle::Danger),
            KeyboardButton::new("next", NEXT_ID),
        ]]
    }
}

/// Async driver binding a [`PageSource`] to a rendered message
pub struct PaginatedView<S: PageSource> {
    source: S,
    timeout: Duration,
}

impl<S: PageSource> PaginatedView<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    async fn render(&self, index: usize, paginator: &Paginator) -> Result<OutgoingMessage, WidgetError> {
        let page = self.source.get_page(index).await?;
        let content = self.source.format_page(page).await;
        Ok(content.into_message()?.with_components(paginator.components()))
    }

    /// Show the first page and serve the owner's interactions until stop or expiry.
    ///
    /// A render contract violation ends this view with an error; the rendered
    /// message is left as it was.
    pub async fn run(self, target: &WidgetTarget) -> Result<PaginatorState, WidgetError> {
        let mut paginator = Paginator::new(
            target.owner_id.clone(),
            self.timeout,
            Instant::now(),
            self.source.max_pages(),
        );

        let first = self.render(0, &paginator).await?;
        let message_id = target.send(first).await?;
        let mut events = target.manager.attach(&message_id);

        let result = self.serve(target, &message_id, &mut paginator, &mut events).await;
        target.manager.detach(&message_id);
        result.map(|()| paginator.state())
    }

    async fn serve(
        &self,
        target: &WidgetTarget,
        message_id: &str,
        paginator: &mut Paginator,
        events: &mut tokio::sync::mpsc::Receiver<crate::domain::entities::Interaction>,
    ) -> Result<(), WidgetError> {
        while paginator.state() == PaginatorState::Active {
            let interaction = match tokio::time::timeout_at(paginator.session().deadline(), events.recv()).await {
                Ok(Some(interaction)) => interaction,
                Ok(None) | Err(_) => {
                    let deadline = paginator.session().deadline();
                    paginator.expire(deadline);
                    break;
                }
            };

            let Some(action) = PageAction::from_custom_id(&interaction.custom_id) else {
                continue;
            };

            match paginator.handle(&interaction.user.id, action, Instant::now()) {
                Outcome::Unauthorized => {
                    tracing::debug!(user = %interaction.user.id, message = %message_id, "rejected page interaction");
                    if let Err(e) = target.bot.respond_ephemeral(&interaction, REJECTION_NOTICE).await {
                        tracing::warn!("Failed to send rejection notice: {}", e);
                    }
                }
                Outcome::Ignored => {}
                Outcome::Applied(PageTransition::Stop) => {
                    target.bot.delete_message(&target.channel_id, message_id).await?;
                }
                Outcome::Applied(PageTransition::Show(page)) => match self.render(page, paginator).await {
                    Ok(rendered) => {
                        target.bot.edit_message(&target.channel_id, message_id, rendered).await?;
                        paginator.commit(page);
                    }
                    Err(WidgetError::PageOutOfRange(page)) => {
                        tracing::debug!(page, "page source has no such page");
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pager(max: Option<usize>) -> (Paginator, Instant) {
        let now = Instant::now();
        (Paginator::new("owner", Duration::from_secs(60), now, max), now)
    }

    fn step(p: &mut Paginator, action: PageAction, now: Instant) -> Outcome<PageTransition> {
        let outcome = p.handle("owner", action, now);
        if let Outcome::Applied(PageTransition::Show(page)) = outcome {
            p.commit(page);
        }
        outcome
    }

    #[test]
    fn test_previous_on_first_page_wraps_to_last() {
        let (mut p, now) = pager(Some(4));
        assert_eq!(step(&mut p, PageAction::Previous, now), Outcome::Applied(PageTransition::Show(3)));
        assert_eq!(p.current_page(), 3);
    }

    #[test]
    fn test_next_on_last_page_wraps_to_first() {
        let (mut p, now) = pager(Some(3));
        step(&mut p, PageAction::Next, now);
        step(&mut p, PageAction::Next, now);
        assert_eq!(p.current_page(), 2);
        assert_eq!(step(&mut p, PageAction::Next, now), Outcome::Applied(PageTransition::Show(0)));
    }

    #[test]
    fn test_single_page_wraps_onto_itself() {
        let (mut p, now) = pager(Some(1));
        assert_eq!(step(&mut p, PageAction::Next, now), Outcome::Applied(PageTransition::Show(0)));
        assert_eq!(step(&mut p, PageAction::Previous, now), Outcome::Applied(PageTransition::Show(0)));
    }

    #[test]
    fn test_unknown_page_count_is_unchecked() {
        let (mut p, now) = pager(None);
        assert_eq!(step(&mut p, PageAction::Previous, now), Outcome::Ignored);
        assert_eq!(step(&mut p, PageAction::Next, now), Outcome::Applied(PageTransition::Show(1)));
        assert_eq!(step(&mut p, PageAction::Next, now), Outcome::Applied(PageTransition::Show(2)));
    }

    #[test]
    fn test_non_owner_never_changes_page_or_deadline() {
        let (mut p, now) = pager(Some(5));
        let deadline = p.session().deadline();
        let later = now + Duration::from_secs(30);

        for action in [PageAction::Next, PageAction::Previous, PageAction::Stop] {
            assert_eq!(p.handle("intruder", action, later), Outcome::Unauthorized);
        }
        assert_eq!(p.current_page(), 0);
        assert_eq!(p.state(), PaginatorState::Active);
        assert_eq!(p.session().deadline(), deadline);
    }

    #[test]
    fn test_owner_interaction_extends_deadline() {
        let (mut p, now) = pager(Some(5));
        let later = now + Duration::from_secs(30);
        step(&mut p, PageAction::Next, later);
        assert_eq!(p.session().deadline(), later + Duration::from_secs(60));
    }

    #[test]
    fn test_stop_terminates() {
        let (mut p, now) = pager(Some(2));
        assert_eq!(step(&mut p, PageAction::Stop, now), Outcome::Applied(PageTransition::Stop));
        assert_eq!(p.state(), PaginatorState::Stopped);
        assert_eq!(step(&mut p, PageAction::Next, now), Outcome::Ignored);
    }

    #[test]
    fn test_expired_view_ignores_everything() {
        let (mut p, now) = pager(Some(2));
        let late = now + Duration::from_secs(61);
        assert_eq!(step(&mut p, PageAction::Next, late), Outcome::Ignored);
        assert_eq!(p.state(), PaginatorState::Expired);
        assert_eq!(p.current_page(), 0);
    }
}
