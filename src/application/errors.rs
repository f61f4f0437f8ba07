//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Command {0} is disabled")]
    Disabled(String),

    #[error("Only the bot owner can use this command")]
    NotOwner,

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Install failed: {0}")]
    Install(#[from] InstallError),

    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<BotError> for CommandError {
    fn from(err: BotError) -> Self {
        CommandError::Transport(err.to_string())
    }
}

/// Extension registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Extension '{0}' is already loaded")]
    Duplicate(String),

    #[error("Failed to load extension '{raw_name}': {message}")]
    Load { raw_name: String, message: String },

    #[error("Command '{command}' from '{raw_name}' is already registered")]
    CommandCollision { raw_name: String, command: String },

    #[error("Extension '{0}' is not loaded")]
    NotFound(String),

    #[error("Extension '{0}' is built in and cannot be unloaded")]
    Protected(String),

    #[error("Registry lock poisoned")]
    Poisoned,
}

/// Structural and metadata problems found in a fetched package
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not a recognized extension")]
    NotAnExtension,

    #[error("metadata unreadable: {0}")]
    MetadataUnreadable(String),

    #[error("metadata incomplete: missing '{0}'")]
    MetadataIncomplete(&'static str),

    #[error("unknown extension type '{0}'")]
    UnknownType(String),

    #[error("raw_name '{0}' is not a valid module name")]
    InvalidRawName(String),
}

/// Installer pipeline failures
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("only the bot owner may install extensions")]
    Permission,

    #[error("failed to fetch {source_location}: {message}")]
    Fetch { source_location: String, message: String },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("extension '{0}' is already installed")]
    Conflict(String),

    #[error("extension '{raw_name}' failed to load: {source}")]
    Load {
        raw_name: String,
        #[source]
        source: RegistryError,
    },

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove temporary checkout {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io { path: path.into(), source }
    }

    /// Single status line shown to the requester.
    pub fn user_message(&self) -> String {
        match self {
            InstallError::Permission => "You can't do this.".to_string(),
            InstallError::Fetch { .. } => {
                "The repo could not be downloaded. Check the location and try again.".to_string()
            }
            InstallError::Validation(ValidationError::NotAnExtension) => {
                "This repo is not a cog/feature or it isn't formatted correctly.".to_string()
            }
            InstallError::Validation(ValidationError::MetadataUnreadable(_)) => {
                "The metadata cannot be decoded.".to_string()
            }
            InstallError::Validation(ValidationError::MetadataIncomplete(_))
            | InstallError::Validation(ValidationError::UnknownType(_))
            | InstallError::Validation(ValidationError::InvalidRawName(_)) => {
                "The metadata is not formatted correctly.".to_string()
            }
            InstallError::Conflict(_) | InstallError::Load { .. } => {
                "A feature/cog with the same name has already been installed.".to_string()
            }
            InstallError::Io { .. } | InstallError::Cleanup { .. } => {
                "Something went wrong while installing, this is an error with me. Please see the console for more information.".to_string()
            }
        }
    }
}

/// Interactive widget failures
#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("page source returned unusable output: {0}")]
    RenderContractViolation(String),

    #[error("page {0} is out of range")]
    PageOutOfRange(usize),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<BotError> for WidgetError {
    fn from(err: BotError) -> Self {
        WidgetError::Transport(err.to_string())
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    Missing(PathBuf),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
