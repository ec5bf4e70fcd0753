use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icalsync_core::backoff::DEFAULT_MAX_WAIT_SECS;
use icalsync_core::{BackoffConfig, SyncConfig};
use icalsync_provider_google::Credentials;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Google OAuth client id
    pub client_id: String,
    pub client_secret: String,

    /// Where the OAuth session is kept (defaults to ~/.config/icalsync/session.toml)
    #[serde(default)]
    pub token_file: Option<String>,

    /// Longest wait, in seconds, before giving up on a rate-limited request
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_max_backoff_secs() -> u64 {
    DEFAULT_MAX_WAIT_SECS
}

/// Get the config directory path (~/.config/icalsync)
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("icalsync"))
}

/// Get the config file path (~/.config/icalsync/config.toml)
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at {}\n\n\
                Create it with your Google OAuth credentials:\n\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"\n\n\
                See https://console.cloud.google.com/apis/credentials for setup.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(file) => Ok(PathBuf::from(shellexpand::tilde(file).into_owned())),
            None => Ok(config_dir()?.join("session.toml")),
        }
    }

    pub fn sync_config(&self, calendar_id: &str) -> SyncConfig {
        SyncConfig {
            calendar_id: calendar_id.to_string(),
            backoff: BackoffConfig {
                max_wait_secs: self.max_backoff_secs,
            },
        }
    }
}
