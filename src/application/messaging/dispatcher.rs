//! Message dispatcher - Routes messages to command handlers and button presses to widgets

use std::sync::Arc;
use crate::application::context::{CommandContext, Services};
use crate::application::errors::CommandError;
use crate::domain::entities::{Command, Content, GatewayEvent, Interaction, Message};
use crate::domain::traits::OutgoingMessage;
use super::classifier::{classify, Verdict, APOLOGY};
use super::middleware::{Context, LoggingMiddleware, Middleware, MiddlewareChain, MiddlewareError, Next};
use super::parser::{Invocation, MessageParser};

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Dropped by a middleware filter
    Filtered,
    NotACommand,
    UnknownCommand(String),
    Completed(String),
    /// The command failed; the failure was classified and answered
    Failed(String, Verdict),
}

/// Message dispatcher - routes messages through middleware to handlers
pub struct MessageDispatcher {
    parser: MessageParser,
    middleware: Vec<Arc<dyn Middleware>>,
    services: Services,
}

impl MessageDispatcher {
    /// Dispatcher with the logging and origin-policy filters installed
    pub fn new(services: Services) -> Self {
        let parser = MessageParser::new(services.config.bot.prefix.clone(), services.bot.bot_info().id);
        Self {
            parser,
            middleware: MiddlewareChain::new()
                .add(LoggingMiddleware)
                .add(super::middleware::OriginPolicyMiddleware)
                .build(),
            services,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Message(message) => {
                self.dispatch(message).await;
            }
            GatewayEvent::Interaction(interaction) => {
                self.dispatch_interaction(interaction);
            }
        }
    }

    /// Hand a button press to the widget that rendered the pressed message
    pub fn dispatch_interaction(&self, interaction: Interaction) -> bool {
        let message_id = interaction.message_id.clone();
        let routed = self.services.widgets.route(interaction);
        if !routed {
            tracing::debug!(message = %message_id, "interaction for a message without a live widget");
        }
        routed
    }

    /// Resolve and run the command in `message`. Never fails: every command error
    /// is classified and answered here.
    pub async fn dispatch(&self, message: Message) -> Dispatched {
        if let Err(MiddlewareError::Ignored(reason)) = Next::new(self.middleware.clone()).run(Context::new(message.clone())) {
            tracing::debug!(channel = %message.channel_id, "message filtered: {}", reason);
            return Dispatched::Filtered;
        }

        let Some(invocation) = self.invocation(&message) else {
            return Dispatched::NotACommand;
        };

        let Some(command) = self.services.registry.find_command(&invocation.name) else {
            tracing::debug!(command = %invocation.name, "unknown command");
            return Dispatched::UnknownCommand(invocation.name);
        };

        let name = command.name.clone();
        let ctx = CommandContext::new(
            self.services.clone(),
            message,
            invocation.invoked_with,
            invocation.args,
            invocation.prefix,
        );

        match self.invoke(&command, ctx.clone()).await {
            Ok(()) => Dispatched::Completed(name),
            Err(error) => {
                let verdict = self.report(&ctx, &name, &error).await;
                Dispatched::Failed(name, verdict)
            }
        }
    }

    fn invocation(&self, message: &Message) -> Option<Invocation> {
        match &message.content {
            Content::Text(text) => self.parser.parse(text),
            Content::Command { name, args } => Some(Invocation {
                name: name.to_lowercase(),
                invoked_with: name.clone(),
                args: args.clone(),
                prefix: self.parser.prefix().to_string(),
            }),
            Content::Empty => None,
        }
    }

    async fn invoke(&self, command: &Command, ctx: CommandContext) -> Result<(), CommandError> {
        if !command.enabled {
            return Err(CommandError::Disabled(command.name.clone()));
        }
        if command.owner_only && !ctx.is_owner() {
            return Err(CommandError::NotOwner);
        }
        let Some(handler) = command.handler.clone() else {
            return Err(CommandError::ExecutionFailed(format!("{} has no handler", command.name)));
        };

        // A panic stays inside the spawned task and comes back as a JoinError.
        match tokio::spawn(handler(ctx)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(CommandError::ExecutionFailed(format!("handler panicked: {}", e))),
            Err(e) => Err(CommandError::ExecutionFailed(e.to_string())),
        }
    }

    async fn report(&self, ctx: &CommandContext, command: &str, error: &CommandError) -> Verdict {
        let verdict = classify(error);
        let reply = match &verdict {
            Verdict::Ignore => None,
            Verdict::Notice(text) => Some(text.clone()),
            Verdict::Fault => {
                tracing::error!(
                    user = %ctx.author_id(),
                    channel = %ctx.message.channel_id,
                    command,
                    "{} caused an error in {}: {}",
                    ctx.message.sender.display_name(),
                    command,
                    error
                );
                Some(APOLOGY.to_string())
            }
        };

        if let Some(text) = reply {
            if let Err(e) = ctx.reply(OutgoingMessage::text(text)).await {
                tracing::warn!("Failed to report command error: {}", e);
            }
        }
        verdict
    }
}
