//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;

pub use bot::{Bot, BotInfo, ButtonStyle, KeyboardButton, OutgoingMessage};
