use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub player_name: String,
    pub difficulty: DifficultyConfig,
    /// Impacts absorbed before the earth takes damage
    pub shield: u32,
    pub health: u32,
    pub submit_scores: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: "pilot".to_string(),
            difficulty: DifficultyConfig::default(),
            shield: 3,
            health: 5,
            submit_scores: true,
        }
    }
}

impl Config {
    /// Config with every value inside its usable range
    pub fn validated(mut self) -> Self {
        self.difficulty = self.difficulty.validated();
        self.health = self.health.max(1);
        let name = self.player_name.trim();
        self.player_name = if name.is_empty() {
            Config::default().player_name
        } else {
            name.chars()
                .take(crate::leaderboard::MAX_PLAYER_NAME_LEN)
                .collect()
        };
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.validated(),
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            player_name: "maverick".into(),
            difficulty: DifficultyConfig {
                words_per_level: 3,
                base_speed: 2.0,
                ..DifficultyConfig::default()
            },
            shield: 0,
            health: 2,
            submit_scores: false,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"player_name":"ace","difficulty":{"words_per_level":0}}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.player_name, "ace");
        assert_eq!(cfg.health, 5);
        assert_eq!(cfg.difficulty.words_per_level, 1);
        assert_eq!(cfg.difficulty.base_interval_ms, 3000);
    }

    #[test]
    fn validated_fixes_name_and_health() {
        let cfg = Config {
            player_name: "   ".into(),
            health: 0,
            ..Config::default()
        }
        .validated();
        assert_eq!(cfg.player_name, "pilot");
        assert_eq!(cfg.health, 1);

        let long = Config {
            player_name: "n".repeat(80),
            ..Config::default()
        }
        .validated();
        assert_eq!(long.player_name.len(), 50);
    }
}
