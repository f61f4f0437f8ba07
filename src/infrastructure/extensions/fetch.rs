//! Fetching extension packages from remote repositories

use std::path::Path;
use async_trait::async_trait;
use tokio::process::Command;
use crate::application::errors::InstallError;

/// Materialises a package from `source` into `dest`, which must not exist yet
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &str, dest: &Path) -> Result<(), InstallError>;
}

/// Shallow `git clone` of the repository
pub struct GitFetcher {
    git: String,
}

impl GitFetcher {
    pub fn new() -> Self {
        Self { git: "git".to_string() }
    }

    /// Use a specific git executable
    pub fn with_binary(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for GitFetcher {
    async fn fetch(&self, source: &str, dest: &Path) -> Result<(), InstallError> {
        let fetch_err = |message: String| InstallError::Fetch {
            source_location: source.to_string(),
            message,
        };

        // A leading dash would be read as a git option.
        if source.trim().is_empty() || source.starts_with('-') {
            return Err(fetch_err("invalid repository location".to_string()));
        }

        let output = Command::new(&self.git)
            .args(["clone", "--depth", "1", "--quiet", "--", source])
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| fetch_err(format!("failed to run git clone: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fetch_err(stderr.trim().to_string()));
        }

        tracing::debug!(%source, dest = %dest.display(), "cloned extension repo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_option_like_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitFetcher::new()
            .fetch("--upload-pack=evil", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitFetcher::with_binary("definitely-not-a-git-binary")
            .fetch("https://example.invalid/repo.git", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Fetch { .. }));
        assert!(!dir.path().join("x").exists());
    }
}
