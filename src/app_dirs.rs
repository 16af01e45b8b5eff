use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typeroids";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn leaderboard_path() -> PathBuf {
        Self::state_dir().join("scores.db")
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("typeroids.log")
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("typeroids_config.json"))
    }
}
