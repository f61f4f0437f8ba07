//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod embed;
pub mod extension;
pub mod interaction;

pub use user::User;
pub use message::{Message, Content};
pub use command::{Command, CommandRegistry};
pub use embed::Embed;
pub use extension::{ExtensionKind, ExtensionRecord, InstallReport};
pub use interaction::{GatewayEvent, Interaction};
