//! Message handling - Event-driven message processing

pub mod classifier;
pub mod dispatcher;
pub mod middleware;
pub mod parser;

pub use classifier::{classify, Verdict};
pub use dispatcher::{Dispatched, MessageDispatcher};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, OriginPolicyMiddleware};
pub use parser::{Invocation, MessageParser};
