//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Context: what a command handler can reach
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing, middleware, dispatching
//! - Services: Installer and help
//! - Widgets: Confirmation prompts and paginated views

pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;
pub mod widgets;
