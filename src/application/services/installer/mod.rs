//! Remote extension installer
//!
//! One install is a strict pipeline: fetch into a throwaway checkout, validate the
//! package, merge its config defaults, relocate helpers and the entry file into the
//! live directories, then load it through the registry. Whatever happens, the
//! checkout is removed before the result is returned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use crate::application::errors::{InstallError, RegistryError, ValidationError};
use crate::domain::entities::{ExtensionKind, InstallReport};
use crate::infrastructure::config::Config;
use crate::infrastructure::extensions::fetch::Fetcher;
use crate::infrastructure::extensions::loader::module_file_name;
use crate::infrastructure::extensions::metadata::ExtensionMetadata;
use crate::infrastructure::extensions::package::{self, PackageLayout};
use crate::infrastructure::extensions::registry::ExtensionRegistry;


/// Receives the status lines of a running install
#[async_trait]
pub trait InstallProgress: Send + Sync {
    async fn update(&self, status: &str);
}

/// Progress sink that discards everything
pub struct SilentProgress;

#[async_trait]
impl InstallProgress for SilentProgress {
    async fn update(&self, _status: &str) {}
}

/// Live directories an install writes into
#[derive(Debug, Clone)]
pub struct InstallPaths {
    pub cogs: PathBuf,
    pub features: PathBuf,
    pub helpers: PathBuf,
    pub configs: PathBuf,
    pub cache: PathBuf,
}

impl InstallPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cogs: config.paths.cogs.clone(),
            features: config.paths.features.clone(),
            helpers: config.paths.helpers.clone(),
            configs: config.paths.configs.clone(),
            cache: config.paths.cache.clone(),
        }
    }

    /// All five directories under `root`
    pub fn under(root: &Path) -> Self {
        Self {
            cogs: root.join("cogs"),
            features: root.join("features"),
            helpers: root.join("helpers"),
            configs: root.join("configs"),
            cache: root.join("cache"),
        }
    }

    fn entry_dir(&self, kind: ExtensionKind) -> &Path {
        match kind {
            ExtensionKind::Feature => &self.features,
            ExtensionKind::Cog | ExtensionKind::Internal => &self.cogs,
        }
    }
}

/// Where files already sitting at a destination are parked during an install.
/// Lives inside the checkout, so it goes away with it.
const DISPLACED_DIR: &str = ".displaced";

/// One file moved into a live directory
struct Placed {
    dest: PathBuf,
    /// The file that was at `dest` before, moved aside
    displaced: Option<PathBuf>,
}

/// Files an install has put into the live directories so far
#[derive(Default)]
struct Relocated {
    helpers: Vec<String>,
    placed: Vec<Placed>,
}

pub struct ExtensionInstaller {
    paths: InstallPaths,
    registry: Arc<ExtensionRegistry>,
    fetcher: Box<dyn Fetcher>,
    /// In-flight installs by raw name
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    cleanup_grace: Duration,
    rollback_on_load_failure: bool,
}

impl ExtensionInstaller {
    pub fn new<F: Fetcher + 'static>(paths: InstallPaths, registry: Arc<ExtensionRegistry>, fetcher: F) -> Self {
        Self {
            paths,
            registry,
            fetcher: Box::new(fetcher),
            locks: Mutex::new(HashMap::new()),
            cleanup_grace: Duration::ZERO,
            rollback_on_load_failure: false,
        }
    }

    /// Wait this long before removing a checkout
    pub fn with_cleanup_grace(mut self, grace: Duration) -> Self {
        self.cleanup_grace = grace;
        self
    }

    /// Undo relocation when the new extension fails to load
    pub fn with_rollback_on_load_failure(mut self, enabled: bool) -> Self {
        self.rollback_on_load_failure = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Install the package at `source`.
    ///
    /// A non-owner request fails before anything is fetched or written.
    pub async fn install(
        &self,
        source: &str,
        requester_is_owner: bool,
        progress: &dyn InstallProgress,
    ) -> Result<InstallReport, InstallError> {
        if !requester_is_owner {
            tracing::warn!(%source, "install refused for non-owner");
            return Err(InstallError::Permission);
        }

        tokio::fs::create_dir_all(&self.paths.cache)
            .await
            .map_err(|e| InstallError::io(&self.paths.cache, e))?;
        let checkout = self.paths.cache.join(uuid::Uuid::new_v4().to_string());

        progress.update("Downloading...").await;
        let result = self.run(source, &checkout, progress).await;

        let cleanup = package::remove_checkout(&checkout, self.cleanup_grace).await;

        match (result, cleanup) {
            (Ok(report), Ok(())) => {
                tracing::info!(raw_name = %report.installed_entry, author = %report.author, "installed extension");
                Ok(report)
            }
            (Ok(report), Err(e)) => {
                tracing::error!(
                    raw_name = %report.installed_entry,
                    checkout = %checkout.display(),
                    "extension installed but the checkout could not be removed: {}", e
                );
                Err(InstallError::Cleanup { path: checkout, source: e })
            }
            (Err(err), cleanup) => {
                if let Err(e) = cleanup {
                    tracing::error!(checkout = %checkout.display(), "failed to remove checkout: {}", e);
                }
                tracing::warn!(%source, "install failed: {}", err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        source: &str,
        checkout: &Path,
        progress: &dyn InstallProgress,
    ) -> Result<InstallReport, InstallError> {
        self.fetcher.fetch(source, checkout).await?;

        let layout = PackageLayout::inspect(checkout)?;
        let metadata = ExtensionMetadata::from_file(&layout.metadata)?;
        // The entry file on disk must be the one the descriptor names.
        if layout.entry_kind != metadata.kind {
            return Err(ValidationError::NotAnExtension.into());
        }

        let lock = self.lock_for(&metadata.raw_name);
        let _guard = lock.lock().await;

        if self.registry.is_loaded(&metadata.raw_name) {
            return Err(InstallError::Conflict(metadata.raw_name));
        }

        progress
            .update(&format!("Installing '{}' By '{}'", metadata.name, metadata.author))
            .await;

        if let Some(defaults) = &metadata.config {
            let path = package::merge_config(&self.paths.configs, &metadata.raw_name, defaults)
                .await
                .map_err(|e| InstallError::io(&self.paths.configs, e))?;
            tracing::debug!(raw_name = %metadata.raw_name, config = %path.display(), "merged config defaults");
        }

        let mut relocated = Relocated::default();
        if let Err(e) = self.relocate_files(checkout, &layout, &metadata, &mut relocated).await {
            tracing::warn!(
                raw_name = %metadata.raw_name,
                "relocation failed after {} file(s), rolling back", relocated.placed.len()
            );
            self.roll_back(&relocated).await;
            return Err(e);
        }

        if let Err(e) = self
            .registry
            .load_with_helpers(metadata.kind, &metadata.raw_name, relocated.helpers.clone())
        {
            tracing::error!(raw_name = %metadata.raw_name, "freshly installed extension failed to load: {}", e);
            if self.rollback_on_load_failure {
                self.roll_back(&relocated).await;
            }
            return Err(match e {
                RegistryError::Duplicate(raw_name) => InstallError::Conflict(raw_name),
                other => InstallError::Load {
                    raw_name: metadata.raw_name,
                    source: other,
                },
            });
        }

        Ok(InstallReport {
            name: metadata.name,
            author: metadata.author,
            installed_helpers: relocated.helpers,
            installed_entry: metadata.raw_name,
        })
    }

    async fn relocate_files(
        &self,
        checkout: &Path,
        layout: &PackageLayout,
        metadata: &ExtensionMetadata,
        relocated: &mut Relocated,
    ) -> Result<(), InstallError> {
        let aside = checkout.join(DISPLACED_DIR);

        let helpers = package::helper_modules(checkout).map_err(|e| InstallError::io(checkout, e))?;
        for (name, src) in helpers {
            let Some(file_name) = src.file_name() else {
                continue;
            };
            let dest = self.paths.helpers.join(file_name);
            Self::place(&src, dest, &aside, relocated).await?;
            relocated.helpers.push(name);
        }

        let dest = self
            .paths
            .entry_dir(metadata.kind)
            .join(module_file_name(&metadata.raw_name));
        Self::place(&layout.entry, dest, &aside, relocated).await
    }

    /// Move `src` to `dest`, parking whatever was at `dest` under `aside` first.
    async fn place(src: &Path, dest: PathBuf, aside: &Path, relocated: &mut Relocated) -> Result<(), InstallError> {
        let occupied = tokio::fs::try_exists(&dest)
            .await
            .map_err(|e| InstallError::io(&dest, e))?;

        let displaced = if occupied {
            let backup = aside.join(relocated.placed.len().to_string());
            package::relocate(&dest, &backup)
                .await
                .map_err(|e| InstallError::io(&dest, e))?;
            tracing::debug!(path = %dest.display(), "moved existing file aside");
            Some(backup)
        } else {
            None
        };

        // Recorded before the move so a failed move still gets the old file back.
        relocated.placed.push(Placed {
            dest: dest.clone(),
            displaced,
        });

        package::relocate(src, &dest)
            .await
            .map_err(|e| InstallError::io(&dest, e))
    }

    /// Remove what this install placed and put displaced files back, newest first
    async fn roll_back(&self, relocated: &Relocated) {
        for placed in relocated.placed.iter().rev() {
            let path = &placed.dest;
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::info!(path = %path.display(), "rolled back relocated file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), "rollback could not remove file: {}", e),
            }

            if let Some(backup) = &placed.displaced {
                match package::relocate(backup, path).await {
                    Ok(()) => tracing::info!(path = %path.display(), "restored previous file"),
                    Err(e) => tracing::error!(path = %path.display(), "could not restore previous file: {}", e),
                }
            }
        }
    }

    fn lock_for(&self, raw_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Forget markers nobody is holding any more.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(raw_name.to_string()).or_default())
    }
}
