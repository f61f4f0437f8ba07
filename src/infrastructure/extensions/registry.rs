//! Extension registry - Manages loaded extensions and the live command table

use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use libloading::Library;
use crate::application::errors::RegistryError;
use crate::domain::entities::{Command, CommandRegistry, ExtensionKind, ExtensionRecord};
use crate::extensions::trait_def::{Extension, ExtensionInfo};
use super::loader::{ExtensionLoader, LoadedUnit};

struct Entry {
    record: ExtensionRecord,
    instance: Arc<dyn Extension>,
    library: Option<Library>,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    commands: CommandRegistry,
    /// Libraries of unloaded extensions. Commands that were already dispatched may
    /// still be running their code, so these are never closed.
    retired: Vec<Library>,
}

/// Registry for managing loaded extensions
///
/// Records and the command table share one lock: a command lookup either sees an
/// extension with all of its commands or not at all.
pub struct ExtensionRegistry {
    state: RwLock<State>,
    loader: Box<dyn ExtensionLoader>,
}

impl ExtensionRegistry {
    pub fn new<L: ExtensionLoader + 'static>(loader: L) -> Self {
        Self {
            state: RwLock::new(State::default()),
            loader: Box::new(loader),
        }
    }

    /// Construct `raw_name` through the loader and make its commands dispatchable
    pub fn load(&self, kind: ExtensionKind, raw_name: &str) -> Result<(), RegistryError> {
        self.load_with_helpers(kind, raw_name, Vec::new())
    }

    /// Like [`load`](Self::load), recording the helper modules installed alongside it
    pub fn load_with_helpers(
        &self,
        kind: ExtensionKind,
        raw_name: &str,
        helper_files: Vec<String>,
    ) -> Result<(), RegistryError> {
        if self.is_loaded(raw_name) {
            return Err(RegistryError::Duplicate(raw_name.to_string()));
        }

        let unit = catch_unwind(AssertUnwindSafe(|| self.loader.load(kind, raw_name)))
            .map_err(|panic| RegistryError::Load {
                raw_name: raw_name.to_string(),
                message: panic_message(panic),
            })??;

        self.insert(kind, raw_name, unit, helper_files)
    }

    /// Register an already constructed extension (the compiled-in set)
    pub fn register(
        &self,
        kind: ExtensionKind,
        raw_name: &str,
        instance: Arc<dyn Extension>,
    ) -> Result<(), RegistryError> {
        if self.is_loaded(raw_name) {
            return Err(RegistryError::Duplicate(raw_name.to_string()));
        }
        self.insert(kind, raw_name, LoadedUnit::from_instance(instance), Vec::new())
    }

    fn insert(
        &self,
        kind: ExtensionKind,
        raw_name: &str,
        unit: LoadedUnit,
        helper_files: Vec<String>,
    ) -> Result<(), RegistryError> {
        let load_err = |message: String| RegistryError::Load {
            raw_name: raw_name.to_string(),
            message,
        };

        let instance = unit.instance;

        catch_unwind(AssertUnwindSafe(|| instance.on_load()))
            .map_err(|panic| load_err(panic_message(panic)))?
            .map_err(load_err)?;

        let commands = match catch_unwind(AssertUnwindSafe(|| instance.commands())) {
            Ok(commands) => commands,
            Err(panic) => {
                instance.on_unload();
                return Err(load_err(panic_message(panic)));
            }
        };

        let inserted = {
            let mut state = self.state.write().map_err(|_| RegistryError::Poisoned)?;
            Self::insert_locked(&mut state, kind, raw_name, &instance, unit.library, commands, helper_files)
        };

        match inserted {
            Ok(count) => {
                tracing::info!(raw_name, kind = %kind, commands = count, "loaded extension");
                Ok(())
            }
            Err(e) => {
                instance.on_unload();
                Err(e)
            }
        }
    }

    fn insert_locked(
        state: &mut State,
        kind: ExtensionKind,
        raw_name: &str,
        instance: &Arc<dyn Extension>,
        library: Option<Library>,
        commands: Vec<Command>,
        helper_files: Vec<String>,
    ) -> Result<usize, RegistryError> {
        // Re-check under the write lock; a concurrent load may have won.
        if state.entries.contains_key(raw_name) {
            return Err(RegistryError::Duplicate(raw_name.to_string()));
        }

        let mut staged = CommandRegistry::new();
        for command in &commands {
            if let Some(taken) = state.commands.conflict(command).or_else(|| staged.conflict(command)) {
                return Err(RegistryError::CommandCollision {
                    raw_name: raw_name.to_string(),
                    command: taken,
                });
            }
            // Only names matter for the conflict check inside this batch.
            staged.register(Command::new(&command.name).with_aliases(command.aliases.clone()));
        }

        let count = commands.len();
        for mut command in commands {
            command.extension = Some(raw_name.to_string());
            state.commands.register(command);
        }

        state.entries.insert(
            raw_name.to_string(),
            Entry {
                record: ExtensionRecord {
                    raw_name: raw_name.to_string(),
                    kind,
                    helper_files,
                },
                instance: Arc::clone(instance),
                library,
            },
        );

        Ok(count)
    }

    /// Remove a cog or feature and its commands
    pub fn unload(&self, raw_name: &str) -> Result<ExtensionRecord, RegistryError> {
        let entry = {
            let mut state = self.state.write().map_err(|_| RegistryError::Poisoned)?;

            match state.entries.get(raw_name) {
                None => return Err(RegistryError::NotFound(raw_name.to_string())),
                Some(entry) if entry.record.kind == ExtensionKind::Internal => {
                    return Err(RegistryError::Protected(raw_name.to_string()));
                }
                Some(_) => {}
            }

            let mut entry = match state.entries.remove(raw_name) {
                Some(entry) => entry,
                None => return Err(RegistryError::NotFound(raw_name.to_string())),
            };
            state.commands.remove_extension(raw_name);
            if let Some(library) = entry.library.take() {
                state.retired.push(library);
            }
            entry
        };

        entry.instance.on_unload();
        tracing::info!(raw_name, "unloaded extension");
        Ok(entry.record)
    }

    /// Check if an extension is loaded in any namespace
    pub fn is_loaded(&self, raw_name: &str) -> bool {
        self.state
            .read()
            .ok()
            .map(|s| s.entries.contains_key(raw_name))
            .unwrap_or(false)
    }

    /// Loaded cogs and features. Internal extensions are not listed.
    pub fn list_loaded(&self) -> BTreeSet<(ExtensionKind, String)> {
        self.state
            .read()
            .ok()
            .map(|s| {
                s.entries
                    .values()
                    .filter(|e| e.record.kind != ExtensionKind::Internal)
                    .map(|e| (e.record.kind, e.record.raw_name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record(&self, raw_name: &str) -> Option<ExtensionRecord> {
        self.state.read().ok()?.entries.get(raw_name).map(|e| e.record.clone())
    }

    /// Resolve a command name or alias against the live table
    pub fn find_command(&self, name: &str) -> Option<Arc<Command>> {
        self.state.read().ok()?.commands.find(name)
    }

    /// Help-facing view of every loaded extension, sorted by raw name
    pub fn extensions(&self) -> Vec<ExtensionInfo> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };

        let mut infos: Vec<ExtensionInfo> = state
            .entries
            .values()
            .map(|e| {
                let mut commands: Vec<String> = state
                    .commands
                    .all()
                    .filter(|c| c.extension.as_deref() == Some(e.record.raw_name.as_str()))
                    .map(|c| c.name.clone())
                    .collect();
                commands.sort();

                ExtensionInfo {
                    raw_name: e.record.raw_name.clone(),
                    kind: e.record.kind,
                    name: e.instance.name().to_string(),
                    description: e.instance.description().map(str::to_string),
                    hidden: e.instance.hidden(),
                    commands,
                }
            })
            .collect();

        infos.sort_by(|a, b| a.raw_name.cmp(&b.raw_name));
        infos
    }

    /// Get the number of loaded extensions, internal ones included
    pub fn len(&self) -> usize {
        self.state.read().ok().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::infrastructure::extensions::loader::CatalogLoader;

    struct Greeter {
        unloads: Arc<AtomicUsize>,
    }

    impl Extension for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("greet").with_aliases(vec!["hi".to_string()])]
        }

        fn on_unload(&self) {
            self.unloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Faulty;

    impl Extension for Faulty {
        fn name(&self) -> &str {
            "Faulty"
        }

        fn commands(&self) -> Vec<Command> {
            Vec::new()
        }

        fn on_load(&self) -> Result<(), String> {
            Err("config missing".to_string())
        }
    }

    struct Panicky;

    impl Extension for Panicky {
        fn name(&self) -> &str {
            "Panicky"
        }

        fn commands(&self) -> Vec<Command> {
            panic!("boom")
        }
    }

    struct Shadow;

    impl Extension for Shadow {
        fn name(&self) -> &str {
            "Shadow"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("wave"), Command::new("HI")]
        }
    }

    fn registry(unloads: Arc<AtomicUsize>) -> ExtensionRegistry {
        ExtensionRegistry::new(
            CatalogLoader::new()
                .with_factory("greet", move || Arc::new(Greeter { unloads: Arc::clone(&unloads) }))
                .with_factory("faulty", || Arc::new(Faulty))
                .with_factory("panicky", || Arc::new(Panicky))
                .with_factory("shadow", || Arc::new(Shadow)),
        )
    }

    #[test]
    fn test_load_makes_commands_dispatchable() {
        let registry = registry(Arc::default());
        registry.load(ExtensionKind::Feature, "greet").unwrap();

        assert!(registry.is_loaded("greet"));
        let cmd = registry.find_command("HI").unwrap();
        assert_eq!(cmd.name, "greet");
        assert_eq!(cmd.extension.as_deref(), Some("greet"));
        assert_eq!(
            registry.list_loaded(),
            BTreeSet::from([(ExtensionKind::Feature, "greet".to_string())])
        );
    }

    #[test]
    fn test_duplicate_across_namespaces_rejected() {
        let registry = registry(Arc::default());
        registry.load(ExtensionKind::Feature, "greet").unwrap();

        let err = registry.load(ExtensionKind::Cog, "greet").unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "greet"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_on_load_failure_is_load_error() {
        let registry = registry(Arc::default());
        let err = registry.load(ExtensionKind::Cog, "faulty").unwrap_err();
        assert!(matches!(err, RegistryError::Load { ref message, .. } if message == "config missing"));
        assert!(!registry.is_loaded("faulty"));
    }

    #[test]
    fn test_panicking_extension_does_not_escape() {
        let registry = registry(Arc::default());
        let err = registry.load(ExtensionKind::Cog, "panicky").unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_command_collision_rolls_back_registration() {
        let unloads = Arc::new(AtomicUsize::new(0));
        let registry = registry(Arc::clone(&unloads));
        registry.load(ExtensionKind::Feature, "greet").unwrap();

        let err = registry.load(ExtensionKind::Cog, "shadow").unwrap_err();
        assert!(matches!(err, RegistryError::CommandCollision { ref command, .. } if command == "hi"));
        assert!(!registry.is_loaded("shadow"));
        assert!(registry.find_command("wave").is_none());
    }

    #[test]
    fn test_unload_removes_commands_and_calls_hook() {
        let unloads = Arc::new(AtomicUsize::new(0));
        let registry = registry(Arc::clone(&unloads));
        registry.load_with_helpers(ExtensionKind::Feature, "greet", vec!["util".to_string()]).unwrap();
        assert_eq!(registry.record("greet").unwrap().helper_files, vec!["util".to_string()]);

        let record = registry.unload("greet").unwrap();
        assert_eq!(record.kind, ExtensionKind::Feature);
        assert!(registry.find_command("greet").is_none());
        assert!(registry.find_command("hi").is_none());
        assert_eq!(unloads.load(Ordering::SeqCst), 1);

        assert!(matches!(registry.unload("greet"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_internal_extensions_are_protected_and_unlisted() {
        let registry = registry(Arc::default());
        registry
            .register(ExtensionKind::Internal, "shadow", Arc::new(Shadow))
            .unwrap();

        assert!(registry.list_loaded().is_empty());
        assert!(registry.find_command("wave").is_some());
        assert!(matches!(registry.unload("shadow"), Err(RegistryError::Protected(_))));
        assert_eq!(registry.extensions()[0].commands, vec!["hi".to_string(), "wave".to_string()]);
    }
}
