//! Domain layer - Core business objects and the seams infrastructure plugs into
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, Embed, extension records)
//! - Traits: Abstractions for infrastructure (Bot)

pub mod entities;
pub mod traits;
