use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::STORAGE_KEY;

pub const DEFAULT_CONFIG_FILE: &str = "stamp_hunt.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `characters.toml` and `stops/`.
    pub content_dir: PathBuf,
    pub save_dir: PathBuf,
    pub storage_key: String,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            content_dir: PathBuf::from("content"),
            save_dir: PathBuf::from(".stamp_hunt"),
            storage_key: STORAGE_KEY.to_string(),
            log_file: PathBuf::from(".stamp_hunt/stamp_hunt.log"),
        }
    }
}

impl Config {
    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}
