//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::domain::entities::ExtensionKind;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub paths: PathsConfig,
    pub installer: InstallerConfig,
    pub widgets: WidgetsConfig,
    pub help: HelpConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    /// User id allowed to run owner-only commands
    pub owner: Option<String>,
    /// Embed colour
    pub color: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PathsConfig {
    pub cogs: PathBuf,
    pub features: PathBuf,
    pub helpers: PathBuf,
    pub configs: PathBuf,
    /// Temporary checkouts live here
    pub cache: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InstallerConfig {
    pub cleanup_grace_ms: u64,
    /// Delete relocated files when the freshly installed extension fails to load
    pub rollback_on_load_failure: bool,
    pub git: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WidgetsConfig {
    pub confirm_timeout_secs: u64,
    pub paginator_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HelpConfig {
    /// Extensions never listed by help
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Guild id stamped on console messages, so commands are not treated as DMs
    pub guild: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "rick-bot".to_string(),
            prefix: "!".to_string(),
            owner: None,
            color: crate::domain::entities::embed::DEFAULT_COLOR,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cogs: PathBuf::from("./cogs"),
            features: PathBuf::from("./features"),
            helpers: PathBuf::from("./helpers"),
            configs: PathBuf::from("./configs"),
            cache: PathBuf::from("./cache"),
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            cleanup_grace_ms: 2000,
            rollback_on_load_failure: false,
            git: "git".to_string(),
        }
    }
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 45,
            paginator_timeout_secs: 60,
        }
    }
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            console: Some(ConsoleConfig {
                enabled: true,
                guild: Some("console".to_string()),
            }),
        }
    }
}

impl Config {
    /// Read the YAML file at `path`. A missing file is an error, not a fallback to defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::Missing(path));
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;

        if config.bot.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue("bot.prefix must not be empty".to_string()));
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            if !prefix.trim().is_empty() {
                self.bot.prefix = prefix;
            }
        }

        if let Ok(owner) = std::env::var("BOT_OWNER") {
            self.bot.owner = Some(owner);
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check if a user ID is the configured owner
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.bot.owner.as_deref() == Some(user_id)
    }

    pub fn extension_dir(&self, kind: ExtensionKind) -> &Path {
        match kind {
            ExtensionKind::Feature => &self.paths.features,
            ExtensionKind::Cog | ExtensionKind::Internal => &self.paths.cogs,
        }
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.widgets.confirm_timeout_secs)
    }

    pub fn paginator_timeout(&self) -> Duration {
        Duration::from_secs(self.widgets.paginator_timeout_secs)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_millis(self.installer.cleanup_grace_ms)
    }
}
