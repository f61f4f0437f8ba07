//! Extension trait definitions

use crate::domain::entities::Command;

/// Core trait that every cog, feature and internal unit implements
pub trait Extension: Send + Sync {
    /// Display name used by help
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> Option<&str> {
        None
    }

    /// Hidden extensions never show up in the help overview
    fn hidden(&self) -> bool {
        false
    }

    /// Commands this extension contributes to the dispatcher
    fn commands(&self) -> Vec<Command>;

    /// Called once before the commands become dispatchable. An error aborts the load.
    fn on_load(&self) -> Result<(), String> {
        Ok(())
    }

    /// Called after the commands were removed from the dispatcher
    fn on_unload(&self) {}
}

/// Symbol a native extension library exports
pub const INIT_SYMBOL: &[u8] = b"rick_extension_init";

/// Function signature of [`INIT_SYMBOL`]. The returned pointer must come from `Box::into_raw`.
pub type ExtensionInitFn = unsafe extern "C" fn() -> *mut dyn Extension;

/// Help-facing description of a loaded extension
#[derive(Debug, Clone)]
pub struct ExtensionInfo {
    pub raw_name: String,
    pub kind: crate::domain::entities::ExtensionKind,
    pub name: String,
    pub description: Option<String>,
    pub hidden: bool,
    pub commands: Vec<String>,
}
