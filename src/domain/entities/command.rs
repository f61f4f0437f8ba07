use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::application::context::CommandContext;
use crate::application::errors::CommandError;

/// Represents a bot command
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub handler: Option<CommandHandler>,
    pub owner_only: bool,
    pub enabled: bool,
    /// Left out of help listings.
    pub hidden: bool,
    /// Raw name of the extension that registered the command.
    pub extension: Option<String>,
}

/// Future returned by a command handler
pub type CommandFuture = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send>>;

/// Command handler function type
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> CommandFuture + Send + Sync>;

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            handler: None,
            owner_only: false,
            enabled: true,
            hidden: false,
            extension: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases.into_iter().map(|a| a.to_lowercase()).collect();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |ctx| Box::pin(handler(ctx))));
        self
    }

    /// All names this command answers to.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("owner_only", &self.owner_only)
            .field("extension", &self.extension)
            .finish()
    }
}

/// Command table keyed by lowercase name and alias
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<Command>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first name or alias of `command` that is already taken, if any.
    pub fn conflict(&self, command: &Command) -> Option<String> {
        command
            .names()
            .find(|n| self.commands.contains_key(*n) || self.aliases.contains_key(*n))
            .map(str::to_string)
    }

    pub fn register(&mut self, command: Command) {
        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), command.name.clone());
        }
        self.commands.insert(command.name.clone(), Arc::new(command));
    }

    /// Case-insensitive lookup by name or alias.
    pub fn find(&self, input: &str) -> Option<Arc<Command>> {
        let key = input.to_lowercase();
        let name = self.aliases.get(&key).unwrap_or(&key);
        self.commands.get(name).cloned()
    }

    /// Drop every command registered by `extension`.
    pub fn remove_extension(&mut self, extension: &str) -> usize {
        let before = self.commands.len();
        self.commands
            .retain(|_, c| c.extension.as_deref() != Some(extension));
        let commands = &self.commands;
        self.aliases.retain(|_, target| commands.contains_key(target));
        before - self.commands.len()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
