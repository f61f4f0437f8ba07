//! Application services - Business logic orchestration

pub mod help_service;
pub mod installer;

pub use help_service::{HelpService, HelpTopic};
pub use installer::{ExtensionInstaller, InstallPaths, InstallProgress, SilentProgress};
