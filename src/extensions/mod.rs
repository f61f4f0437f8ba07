//! Extension system
//!
//! Cogs and features implement [`Extension`]. The internal set is compiled in and
//! registered before anything is loaded from disk.

pub mod internal;
pub mod trait_def;

pub use trait_def::{Extension, ExtensionInfo};

use std::sync::Arc;
use crate::application::errors::RegistryError;
use crate::domain::entities::ExtensionKind;
use crate::infrastructure::extensions::registry::ExtensionRegistry;

/// Register the installer and help cogs
pub fn register_internal(registry: &ExtensionRegistry) -> Result<(), RegistryError> {
    registry.register(ExtensionKind::Internal, internal::INSTALLER, Arc::new(internal::InstallerCog))?;
    registry.register(ExtensionKind::Internal, internal::HELP, Arc::new(internal::HelpCog))?;
    Ok(())
}
