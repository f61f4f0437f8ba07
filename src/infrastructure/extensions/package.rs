//! Filesystem side of an install: package layout, config merge, relocation and checkout removal

use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::application::errors::ValidationError;
use crate::domain::entities::ExtensionKind;
use super::loader::module_file_name;
use super::metadata::{ConfigDefaults, METADATA_FILE};

/// Subdirectory of a package holding auxiliary modules
pub const HELPERS_DIR: &str = "helpers";

/// What the root of a fetched package contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    pub metadata: PathBuf,
    pub entry: PathBuf,
    pub entry_kind: ExtensionKind,
}

impl PackageLayout {
    /// Require the descriptor and exactly one of the cog/feature entry files.
    pub fn inspect(root: &Path) -> Result<Self, ValidationError> {
        let metadata = root.join(METADATA_FILE);
        if !metadata.is_file() {
            return Err(ValidationError::NotAnExtension);
        }

        let cog = root.join(module_file_name(ExtensionKind::Cog.as_str()));
        let feature = root.join(module_file_name(ExtensionKind::Feature.as_str()));

        let (entry, entry_kind) = match (cog.is_file(), feature.is_file()) {
            (true, false) => (cog, ExtensionKind::Cog),
            (false, true) => (feature, ExtensionKind::Feature),
            _ => return Err(ValidationError::NotAnExtension),
        };

        Ok(Self { metadata, entry, entry_kind })
    }
}

/// Merge declared defaults into `<configs_dir>/<raw_name>.toml`.
///
/// Sections are keyed by their uppercased name. Sections and values already on
/// disk are kept; only missing keys receive the declared default.
pub async fn merge_config(configs_dir: &Path, raw_name: &str, defaults: &ConfigDefaults) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(configs_dir).await?;
    let path = configs_dir.join(format!("{}.toml", raw_name));

    let mut table = match tokio::fs::read_to_string(&path).await {
        Ok(existing) => existing
            .parse::<toml::Table>()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e),
    };

    for (section, entries) in defaults {
        let section_value = table
            .entry(section.to_uppercase())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));

        let toml::Value::Table(section_table) = section_value else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("'{}' in {} is not a section", section.to_uppercase(), path.display()),
            ));
        };

        for (key, value) in entries {
            if !section_table.contains_key(key) {
                section_table.insert(key.clone(), json_to_toml(value));
            }
        }
    }

    let rendered = toml::to_string_pretty(&table)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    tokio::fs::write(&path, rendered).await?;

    Ok(path)
}

/// Config files hold scalar values; anything structured is stored as its JSON text.
fn json_to_toml(value: &serde_json::Value) -> toml::Value {
    match value {
        serde_json::Value::String(s) => toml::Value::String(s.clone()),
        serde_json::Value::Bool(b) => toml::Value::Boolean(*b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => toml::Value::Integer(i),
            (None, Some(f)) => toml::Value::Float(f),
            _ => toml::Value::String(n.to_string()),
        },
        serde_json::Value::Null => toml::Value::String(String::new()),
        other => toml::Value::String(other.to_string()),
    }
}

/// Move a file, falling back to copy + remove when a rename is impossible (e.g. across devices).
pub async fn relocate(src: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!("rename {} failed ({}), copying instead", src.display(), rename_err);
            tokio::fs::copy(src, dest).await?;
            tokio::fs::remove_file(src).await
        }
    }
}

/// Helper modules in `<package>/helpers`, sorted by name. Missing directory means none.
pub fn helper_modules(package_root: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let dir = package_root.join(HELPERS_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut helpers = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(std::env::consts::DLL_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            helpers.push((stem.to_string(), path.clone()));
        }
    }

    helpers.sort();
    Ok(helpers)
}

/// Remove a temporary checkout after `grace`, repairing read-only entries once if needed.
pub async fn remove_checkout(path: &Path, grace: Duration) -> std::io::Result<()> {
    if !grace.is_zero() {
        tokio::time::sleep(grace).await;
    }

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || remove_tree(&path))
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

fn remove_tree(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            tracing::warn!("{} has read-only entries, clearing the flag and retrying", path.display());
            make_writable(path)?;
            std::fs::remove_dir_all(path)
        }
        Err(e) => Err(e),
    }
}

fn make_writable(root: &Path) -> std::io::Result<()> {
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        let mut perms = entry.metadata().map_err(std::io::Error::from)?.permissions();
        if perms.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            std::fs::set_permissions(entry.path(), perms)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn defaults(section: &str, pairs: &[(&str, serde_json::Value)]) -> ConfigDefaults {
        let mut entries = BTreeMap::new();
        for (k, v) in pairs {
            entries.insert(k.to_string(), v.clone());
        }
        let mut map = BTreeMap::new();
        map.insert(section.to_string(), entries);
        map
    }

    #[test]
    fn test_layout_requires_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(module_file_name("cog")), b"").unwrap();
        assert_eq!(PackageLayout::inspect(dir.path()), Err(ValidationError::NotAnExtension));
    }

    #[test]
    fn test_layout_requires_exactly_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), b"{}").unwrap();
        assert_eq!(PackageLayout::inspect(dir.path()), Err(ValidationError::NotAnExtension));

        std::fs::write(dir.path().join(module_file_name("cog")), b"").unwrap();
        let layout = PackageLayout::inspect(dir.path()).unwrap();
        assert_eq!(layout.entry_kind, ExtensionKind::Cog);

        std::fs::write(dir.path().join(module_file_name("feature")), b"").unwrap();
        assert_eq!(PackageLayout::inspect(dir.path()), Err(ValidationError::NotAnExtension));
    }

    #[tokio::test]
    async fn test_merge_config_creates_uppercase_sections() {
        let dir = tempfile::tempdir().unwrap();
        let configs = dir.path().join("configs");
        let path = merge_config(
            &configs,
            "greet",
            &defaults("greeting", &[("text", serde_json::json!("hello")), ("times", serde_json::json!(2))]),
        )
        .await
        .unwrap();

        assert_eq!(path, configs.join("greet.toml"));
        let table: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(table["GREETING"]["text"].as_str(), Some("hello"));
        assert_eq!(table["GREETING"]["times"].as_integer(), Some(2));
    }

    #[tokio::test]
    async fn test_merge_config_keeps_existing_values_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("greet.toml"),
            "[GREETING]\ntext = \"howdy\"\n\n[OTHER]\nkeep = true\n",
        )
        .unwrap();

        merge_config(
            dir.path(),
            "greet",
            &defaults("greeting", &[("text", serde_json::json!("hello")), ("emoji", serde_json::json!("wave"))]),
        )
        .await
        .unwrap();

        let table: toml::Table = std::fs::read_to_string(dir.path().join("greet.toml"))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(table["GREETING"]["text"].as_str(), Some("howdy"));
        assert_eq!(table["GREETING"]["emoji"].as_str(), Some("wave"));
        assert_eq!(table["OTHER"]["keep"].as_bool(), Some(true));
    }

    #[tokio::test]
    async fn test_relocate_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("feature.bin");
        std::fs::write(&src, b"payload").unwrap();
        let dest = dir.path().join("features").join("greet.bin");

        relocate(&src, &dest).await.unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_helper_modules_lists_only_modules() {
        let dir = tempfile::tempdir().unwrap();
        let helpers = dir.path().join(HELPERS_DIR);
        std::fs::create_dir_all(&helpers).unwrap();
        std::fs::write(helpers.join(module_file_name("util")), b"").unwrap();
        std::fs::write(helpers.join("notes.txt"), b"").unwrap();

        let found = helper_modules(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "util");
        assert!(helper_modules(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[cfg(unix)]
    fn set_readonly(path: &Path, readonly: bool) {
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(readonly);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_remove_checkout_repairs_read_only_directories() {
        let dir = tempfile::tempdir().unwrap();
        let checkout = dir.path().join("checkout");
        let objects = checkout.join(".git").join("objects");
        std::fs::create_dir_all(&objects).unwrap();
        std::fs::write(objects.join("pack"), b"x").unwrap();
        set_readonly(&objects, true);

        // Permission bits do not bind root; nothing to repair then.
        if std::fs::write(objects.join("write-check"), b"").is_ok() {
            set_readonly(&objects, false);
            return;
        }
        assert_eq!(
            std::fs::remove_dir_all(&checkout).unwrap_err().kind(),
            std::io::ErrorKind::PermissionDenied
        );

        remove_checkout(&checkout, Duration::ZERO).await.unwrap();
        assert!(!checkout.exists());

        // already gone is fine
        remove_checkout(&checkout, Duration::ZERO).await.unwrap();
    }
}
