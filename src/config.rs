use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime configuration (~/.config/cinesync/config.toml).
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Marker embedded in created entries' descriptions and used as the
    /// search filter when reading existing entries back.
    pub search_key: String,

    /// Sender addresses whose mail is scanned for tickets.
    pub senders: Vec<String>,

    /// Provider name (resolved to `cinesync-provider-{name}` on PATH).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Provider account identifier (e.g. the Gmail address).
    pub account: String,

    /// Calendar to register entries on. Provider default when omitted.
    #[serde(default)]
    pub calendar_id: Option<String>,
}

fn default_provider() -> String {
    "google".to_string()
}

/// Get the config directory path (~/.config/cinesync)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("cinesync");
    Ok(config_dir)
}

/// Get the config file path (~/.config/cinesync/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/cinesync/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your ticket mail settings:\n\n\
            search_key = \"シネマシティ\"\n\
            senders = [\"ticket@cinemacity.co.jp\"]\n\
            provider = \"google\"\n\
            account = \"you@gmail.com\"\n\n\
            Run `cinesync auth google` first to authenticate the account.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    if config.senders.is_empty() {
        anyhow::bail!("Config at {} has an empty `senders` list", path.display());
    }

    Ok(config)
}
