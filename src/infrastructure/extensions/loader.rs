//! Extension loader - constructs handler objects for `(kind, raw_name)` pairs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use libloading::{Library, Symbol};
use crate::application::errors::RegistryError;
use crate::domain::entities::ExtensionKind;
use crate::extensions::trait_def::{Extension, ExtensionInitFn, INIT_SYMBOL};

/// A constructed extension, plus the library its code lives in when it was loaded natively
pub struct LoadedUnit {
    pub instance: Arc<dyn Extension>,
    pub library: Option<Library>,
}

impl LoadedUnit {
    pub fn from_instance(instance: Arc<dyn Extension>) -> Self {
        Self { instance, library: None }
    }
}

/// Constructs extensions by name
pub trait ExtensionLoader: Send + Sync {
    fn load(&self, kind: ExtensionKind, raw_name: &str) -> Result<LoadedUnit, RegistryError>;
}

/// File name of an entry point or helper module on this platform
pub fn module_file_name(stem: &str) -> String {
    format!("{}.{}", stem, std::env::consts::DLL_EXTENSION)
}

/// Loads `<dir>/<raw_name>.<dll>` shared libraries from the live cog and feature directories
///
/// Each load opens a uniquely named copy under the staging directory. The dynamic
/// linker reuses an open library with the same path, so opening the live file
/// directly would hand a reinstalled extension its unloaded predecessor's code.
pub struct NativeLoader {
    cogs_dir: PathBuf,
    features_dir: PathBuf,
    staging_dir: PathBuf,
}

impl NativeLoader {
    pub fn new(cogs_dir: impl Into<PathBuf>, features_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            cogs_dir: cogs_dir.into(),
            features_dir: features_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    fn dir_for(&self, kind: ExtensionKind) -> Option<&Path> {
        match kind {
            ExtensionKind::Cog => Some(&self.cogs_dir),
            ExtensionKind::Feature => Some(&self.features_dir),
            ExtensionKind::Internal => None,
        }
    }
}

impl ExtensionLoader for NativeLoader {
    fn load(&self, kind: ExtensionKind, raw_name: &str) -> Result<LoadedUnit, RegistryError> {
        let load_err = |message: String| RegistryError::Load {
            raw_name: raw_name.to_string(),
            message,
        };

        let dir = self
            .dir_for(kind)
            .ok_or_else(|| load_err("internal extensions are not loaded from disk".to_string()))?;
        let library_path = dir.join(module_file_name(raw_name));

        if !library_path.exists() {
            return Err(load_err(format!("Library not found: {}", library_path.display())));
        }

        let staged = stage_library(&library_path, &self.staging_dir, raw_name)
            .map_err(|e| load_err(format!("Failed to stage library: {}", e)))?;

        // Load the library
        let opened = unsafe { Library::new(&staged) };
        // An open library stays mapped after its file is unlinked.
        if cfg!(unix) || opened.is_err() {
            if let Err(e) = std::fs::remove_file(&staged) {
                tracing::debug!(path = %staged.display(), "staged library not removed: {}", e);
            }
        }
        let library = opened.map_err(|e| load_err(format!("Failed to load library: {}", e)))?;

        let instance: Box<dyn Extension> = unsafe {
            let init_fn: Symbol<ExtensionInitFn> = library
                .get(INIT_SYMBOL)
                .map_err(|e| load_err(format!("Failed to find init function: {}", e)))?;

            let ptr = init_fn();
            if ptr.is_null() {
                return Err(load_err("Extension init returned null".to_string()));
            }
            Box::from_raw(ptr)
        };

        tracing::info!(raw_name, kind = %kind, path = %library_path.display(), "opened extension library");

        Ok(LoadedUnit {
            instance: Arc::from(instance),
            library: Some(library),
        })
    }
}

/// Copy `library` to `<staging>/<raw_name>-<uuid>.<dll>`
pub fn stage_library(library: &Path, staging: &Path, raw_name: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(staging)?;
    let stem = format!("{}-{}", raw_name, uuid::Uuid::new_v4().simple());
    let staged = staging.join(module_file_name(&stem));
    std::fs::copy(library, &staged)?;
    Ok(staged)
}

/// Factory producing a fresh extension instance
pub type ExtensionFactory = Arc<dyn Fn() -> Arc<dyn Extension> + Send + Sync>;

/// Compiled-in factory table
#[derive(Default)]
pub struct CatalogLoader {
    factories: HashMap<String, ExtensionFactory>,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory<F>(mut self, raw_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Extension> + Send + Sync + 'static,
    {
        self.factories.insert(raw_name.into(), Arc::new(factory));
        self
    }
}

impl ExtensionLoader for CatalogLoader {
    fn load(&self, kind: ExtensionKind, raw_name: &str) -> Result<LoadedUnit, RegistryError> {
        if let Some(factory) = self.factories.get(raw_name) {
            return Ok(LoadedUnit::from_instance(factory()));
        }

        Err(RegistryError::Load {
            raw_name: raw_name.to_string(),
            message: format!("no {} named '{}' is available", kind, raw_name),
        })
    }
}

/// List the entry files sitting in the live cog and feature directories
pub fn discover_entries(cogs_dir: &Path, features_dir: &Path) -> Vec<(ExtensionKind, String)> {
    let mut found = Vec::new();

    for (kind, dir) in [(ExtensionKind::Cog, cogs_dir), (ExtensionKind::Feature, features_dir)] {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Extension directory {} unreadable: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(std::env::consts::DLL_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    found.push((kind, stem.to_string()));
                }
            }
        }
    }

    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Command;

    struct Named(&'static str);

    impl Extension for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn commands(&self) -> Vec<Command> {
            Vec::new()
        }
    }

    #[test]
    fn test_catalog_loads_known_factory() {
        let loader = CatalogLoader::new().with_factory("greet", || Arc::new(Named("Greeter")));
        let unit = loader.load(ExtensionKind::Feature, "greet").unwrap();
        assert_eq!(unit.instance.name(), "Greeter");
        assert!(unit.library.is_none());
    }

    #[test]
    fn test_catalog_rejects_unknown() {
        let loader = CatalogLoader::new();
        let err = loader.load(ExtensionKind::Cog, "ghost").err().unwrap();
        assert!(matches!(err, RegistryError::Load { raw_name, .. } if raw_name == "ghost"));
    }

    #[test]
    fn test_native_loader_reports_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let loader = NativeLoader::new(dir.path().join("cogs"), dir.path().join("features"), dir.path().join("staging"));
        let err = loader.load(ExtensionKind::Cog, "absent").err().unwrap();
        assert!(err.to_string().contains("Library not found"));
    }

    #[test]
    fn test_native_loader_rejects_invalid_library() {
        let dir = tempfile::tempdir().unwrap();
        let features = dir.path().join("features");
        std::fs::create_dir_all(&features).unwrap();
        std::fs::write(features.join(module_file_name("broken")), b"not a library").unwrap();

        let staging = dir.path().join("staging");
        let loader = NativeLoader::new(dir.path().join("cogs"), &features, &staging);
        let err = loader.load(ExtensionKind::Feature, "broken").err().unwrap();
        assert!(err.to_string().contains("Failed to load library"));
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_each_load_gets_its_own_library_path() {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join(module_file_name("greet"));
        std::fs::write(&live, b"v1").unwrap();
        let staging = dir.path().join("staging");

        let first = stage_library(&live, &staging, "greet").unwrap();
        std::fs::write(&live, b"v2").unwrap();
        let second = stage_library(&live, &staging, "greet").unwrap();

        assert_ne!(first, second);
        assert_ne!(first, live);
        assert_eq!(std::fs::read(&first).unwrap(), b"v1");
        assert_eq!(std::fs::read(&second).unwrap(), b"v2");
        assert!(first.file_name().unwrap().to_string_lossy().starts_with("greet-"));
    }

    #[test]
    fn test_discover_entries_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let cogs = dir.path().join("cogs");
        let features = dir.path().join("features");
        std::fs::create_dir_all(&cogs).unwrap();
        std::fs::create_dir_all(&features).unwrap();
        std::fs::write(cogs.join(module_file_name("moderation")), b"").unwrap();
        std::fs::write(cogs.join("README.md"), b"").unwrap();
        std::fs::write(features.join(module_file_name("greet")), b"").unwrap();

        let found = discover_entries(&cogs, &features);
        assert_eq!(
            found,
            vec![
                (ExtensionKind::Cog, "moderation".to_string()),
                (ExtensionKind::Feature, "greet".to_string()),
            ]
        );
    }
}
