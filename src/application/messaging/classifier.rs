//! Maps command failures to what the invoking user gets to see

use crate::application::errors::{CommandError, RegistryError, WidgetError};

/// Reply given when a command fails for a reason the user cannot fix
pub const APOLOGY: &str =
    "Something went wrong while running that command, this is an error with me. Please see the console for more information.";

pub const MISSING_ARGUMENTS: &str = "Please provide all the required arguments when using this command.";

pub const NOT_OWNER: &str = "You can't do this.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Say nothing
    Ignore,
    /// Tell the user what went wrong
    Notice(String),
    /// Log with full context and apologise
    Fault,
}

pub fn classify(error: &CommandError) -> Verdict {
    match error {
        CommandError::Disabled(name) => Verdict::Notice(format!("{} has been disabled.", name)),
        CommandError::NotOwner => Verdict::Notice(NOT_OWNER.to_string()),
        CommandError::MissingArgument(_) => Verdict::Notice(MISSING_ARGUMENTS.to_string()),
        CommandError::Install(e) => Verdict::Notice(e.user_message()),
        CommandError::Registry(RegistryError::NotFound(name)) => {
            Verdict::Notice(format!("'{}' is not loaded.", name))
        }
        CommandError::Registry(RegistryError::Protected(name)) => {
            Verdict::Notice(format!("'{}' is built in and cannot be unloaded.", name))
        }
        CommandError::Widget(WidgetError::PageOutOfRange(_)) => Verdict::Ignore,
        CommandError::Registry(_)
        | CommandError::Widget(_)
        | CommandError::ExecutionFailed(_)
        | CommandError::Transport(_) => Verdict::Fault,
    }
}
