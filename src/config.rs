//! Config module.
//! Reads `config.json` from the platform config directory
//! (`~/.config/jeopardy-rs/config.json` on Linux).
//! Every field has a default, so a missing file or a partial one is fine.
//! The data directory can be overridden with `JEOPARDY_DATA_DIR` or `--data-dir`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const APP_DIR: &str = "jeopardy-rs";
pub const DATA_DIR_ENV: &str = "JEOPARDY_DATA_DIR";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where packs and saves live. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Names pre-filled on the setup view.
    pub default_players: Vec<String>,
    /// Seconds per question; 0 turns the countdown off.
    pub default_timer_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_players: vec!["Player 1".to_string(), "Player 2".to_string()],
            default_timer_secs: 30,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        serde_json::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Data directory after applying overrides: flag, then environment, then
    /// config file, then the platform default.
    pub fn resolve_data_dir(&self, flag: Option<&Path>, env: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = flag {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = env.filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir);
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .context("Could not determine a data directory; pass --data-dir")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_timer_secs, 30);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_timer_secs": 0}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_timer_secs, 0);
        assert_eq!(config.default_players.len(), 2);
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_data_dir_precedence() {
        let config = Config {
            data_dir: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let flag = PathBuf::from("/from/flag");

        assert_eq!(
            config.resolve_data_dir(Some(&flag), Some(PathBuf::from("/from/env"))).unwrap(),
            flag
        );
        assert_eq!(
            config.resolve_data_dir(None, Some(PathBuf::from("/from/env"))).unwrap(),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            config.resolve_data_dir(None, Some(PathBuf::new())).unwrap(),
            PathBuf::from("/from/config")
        );
    }
}
