//! Middleware system for message processing pipeline

use std::sync::Arc;
use crate::domain::entities::Message;

/// Context passed through middleware chain
#[derive(Debug, Clone)]
pub struct Context {
    pub message: Message,
    pub channel_id: String,
    pub user_id: String,
}

impl Context {
    pub fn new(message: Message) -> Self {
        let channel_id = message.channel_id.clone();
        let user_id = message.sender.id.clone();

        Self {
            message,
            channel_id,
            user_id,
        }
    }
}

/// Middleware trait - processors that can intercept and modify message handling
pub trait Middleware: Send + Sync {
    /// Process a message and optionally modify the context
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult;
}

/// Result of middleware processing
pub type MiddlewareResult = Result<Context, MiddlewareError>;

/// Middleware errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareError {
    /// Drop the message without a reply
    Ignored(String),
}

impl std::fmt::Display for MiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareError::Ignored(reason) => write!(f, "Ignored: {}", reason),
        }
    }
}

impl std::error::Error for MiddlewareError {}

/// Next middleware in chain
#[derive(Clone)]
pub struct Next {
    remaining: Arc<[Arc<dyn Middleware>]>,
}

impl Next {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            remaining: middlewares.into(),
        }
    }

    /// Process remaining middleware
    pub fn run(self, ctx: Context) -> MiddlewareResult {
        match self.remaining.split_first() {
            Some((first, rest)) => {
                let next = Next::new(rest.to_vec());
                first.process(ctx, next)
            }
            // No more middleware, processing complete
            None => Ok(ctx),
        }
    }
}

/// Middleware chain builder
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands only run in server channels, for human authors
pub struct OriginPolicyMiddleware;

impl Middleware for OriginPolicyMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        if ctx.message.sender.is_bot {
            return Err(MiddlewareError::Ignored("bot author".to_string()));
        }
        if ctx.message.is_direct() {
            return Err(MiddlewareError::Ignored("direct message".to_string()));
        }
        if ctx.message.webhook_id.is_some() {
            return Err(MiddlewareError::Ignored("webhook".to_string()));
        }

        next.run(ctx)
    }
}

/// Logging middleware for debugging
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        let msg_preview = ctx.message.content.text()
            .map(|s| s.chars().take(50).collect::<String>())
            .unwrap_or_else(|| "[command]".to_string());

        tracing::debug!("[{}] {}", ctx.channel_id, msg_preview);

        let channel_id = ctx.channel_id.clone();
        let result = next.run(ctx);

        match &result {
            Ok(_) => {
                tracing::debug!("[{}] Passed filters", channel_id);
            }
            Err(e) => {
                tracing::debug!("[{}] {}", channel_id, e);
            }
        }

        result
    }
}
