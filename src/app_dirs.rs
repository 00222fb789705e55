use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "invigil") {
            proj_dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("invigil_config.json")
        }
    }

    /// Session log file. Logging goes to a file because stderr belongs to
    /// the alternate screen while the session is running.
    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("invigil")
                .join("session.log")
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "invigil") {
            proj_dirs.data_local_dir().join("session.log")
        } else {
            PathBuf::from("invigil_session.log")
        }
    }
}
