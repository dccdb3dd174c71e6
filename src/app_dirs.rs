use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "pomo";
pub const DOCUMENT_FILE_NAME: &str = "pomodoro_config.json";
pub const LOG_FILE_NAME: &str = "pomo.log";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Settings and per-day stats live in one JSON document.
    pub fn document_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().join(DOCUMENT_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DOCUMENT_FILE_NAME))
    }

    pub fn log_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }
}
