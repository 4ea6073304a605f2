//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/blossom/client.toml`
//! - Windows: `%APPDATA%/blossom/client.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use blossom_client::ClientConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration: client settings plus the stored authorization value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub client: ClientConfig,

    /// Pre-built `Authorization` header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!(path = %path.display(), "created default configuration");
            Ok(config)
        }
    }

    /// Writes the configuration; the file may hold a credential, so it is
    /// made owner-only on Unix.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("blossom").join("client.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("blossom")
            .join("client.toml"))
    }
}
