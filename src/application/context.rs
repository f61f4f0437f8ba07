//! Per-invocation context handed to command handlers

use std::sync::Arc;
use crate::application::errors::{BotError, WidgetError};
use crate::application::services::ExtensionInstaller;
use crate::application::widgets::{
    run_confirm, ConfirmOptions, PageSource, PaginatedView, PaginatorState, WidgetManager, WidgetTarget,
};
use crate::domain::entities::{Embed, Message};
use crate::domain::traits::{Bot, OutgoingMessage};
use crate::infrastructure::config::Config;
use crate::infrastructure::extensions::registry::ExtensionRegistry;

/// Shared services every command can reach
#[derive(Clone)]
pub struct Services {
    pub bot: Arc<dyn Bot>,
    pub config: Arc<Config>,
    pub registry: Arc<ExtensionRegistry>,
    pub widgets: Arc<WidgetManager>,
    pub installer: Arc<ExtensionInstaller>,
}

#[derive(Clone)]
pub struct CommandContext {
    pub services: Services,
    pub message: Message,
    pub args: Vec<String>,
    /// Name or alias the user typed
    pub invoked_with: String,
    pub prefix: String,
}

impl CommandContext {
    pub fn new(services: Services, message: Message, invoked_with: impl Into<String>, args: Vec<String>, prefix: impl Into<String>) -> Self {
        Self {
            services,
            message,
            args,
            invoked_with: invoked_with.into(),
            prefix: prefix.into(),
        }
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.services.bot
    }

    pub fn config(&self) -> &Config {
        &self.services.config
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.services.registry
    }

    pub fn installer(&self) -> &Arc<ExtensionInstaller> {
        &self.services.installer
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn author_id(&self) -> &str {
        &self.message.sender.id
    }

    pub fn is_owner(&self) -> bool {
        self.config().is_owner(self.author_id())
    }

    pub async fn send(&self, message: OutgoingMessage) -> Result<String, BotError> {
        self.bot().send_message(&self.message.channel_id, message).await
    }

    /// Reply to the invoking message. If the reply is refused (the message may be
    /// gone already) the content is sent as a plain message instead.
    pub async fn reply(&self, message: OutgoingMessage) -> Result<String, BotError> {
        match self.send(message.clone().replying_to(self.message.id.clone())).await {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::debug!(channel = %self.message.channel_id, "reply failed ({}), sending instead", e);
                self.send(message).await
            }
        }
    }

    /// Embed preset with the configured colour
    pub fn embed(&self) -> Embed {
        Embed::new().with_color(self.config().bot.color)
    }

    /// Post one of the boxed status lines and return its message id
    pub async fn status(&self, text: &str) -> Result<String, BotError> {
        self.reply(OutgoingMessage::embed(self.status_embed(text))).await
    }

    pub async fn edit_status(&self, message_id: &str, text: &str) -> Result<(), BotError> {
        self.bot()
            .edit_message(&self.message.channel_id, message_id, OutgoingMessage::embed(self.status_embed(text)))
            .await
    }

    fn status_embed(&self, text: &str) -> Embed {
        Embed::status(text).with_color(self.config().bot.color)
    }

    fn widget_target(&self) -> WidgetTarget {
        WidgetTarget {
            bot: Arc::clone(self.bot()),
            manager: Arc::clone(&self.services.widgets),
            channel_id: self.message.channel_id.clone(),
            reply_to: Some(self.message.id.clone()),
            owner_id: self.author_id().to_string(),
        }
    }

    /// Ask the invoking user a yes/no question. `None` means nobody answered in time.
    pub async fn confirm(&self, content: &str, delete_after: bool) -> Result<Option<bool>, WidgetError> {
        let options = ConfirmOptions {
            timeout: self.config().confirm_timeout(),
            delete_after,
        };
        run_confirm(&self.widget_target(), content, options).await
    }

    pub async fn paginate<S: PageSource>(&self, source: S) -> Result<PaginatorState, WidgetError> {
        PaginatedView::new(source, self.config().paginator_timeout())
            .run(&self.widget_target())
            .await
    }
}

#[cfg(test)]
impl Services {
    /// Services around a recording adapter, with `owner` as the configured owner
    pub fn for_tests(
        bot: Arc<crate::infrastructure::adapters::recording::RecordingBot>,
        registry: Arc<ExtensionRegistry>,
        owner: &str,
    ) -> Self {
        use crate::application::services::installer::InstallPaths;
        use crate::infrastructure::extensions::fetch::GitFetcher;

        let mut config = Config::default();
        config.bot.owner = Some(owner.to_string());
        let paths = InstallPaths::under(&std::env::temp_dir().join(format!("rick-bot-{}", uuid::Uuid::new_v4())));

        Self {
            bot,
            config: Arc::new(config),
            registry: Arc::clone(&registry),
            widgets: Arc::new(WidgetManager::new()),
            installer: Arc::new(ExtensionInstaller::new(paths, registry, GitFetcher::new())),
        }
    }
}
