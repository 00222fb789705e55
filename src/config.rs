use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server_url: String,
    pub deadline_secs: u64,
    pub idle_timeout_secs: u64,
    pub min_answer_chars: usize,
    pub max_violations: Option<u32>,
    /// Shell command producing one JPEG frame on stdout, e.g.
    /// "fswebcam --no-banner -". None disables camera evidence.
    pub capture_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            server_url: "http://localhost:5000/api".to_string(),
            deadline_secs: session.deadline_secs,
            idle_timeout_secs: session.idle_timeout_secs,
            min_answer_chars: session.min_answer_chars,
            max_violations: session.max_violations,
            capture_command: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            deadline_secs: self.deadline_secs,
            idle_timeout_secs: self.idle_timeout_secs,
            min_answer_chars: self.min_answer_chars,
            max_violations: self.max_violations,
        }
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
    #[allow(clippy::new_without_default)]
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
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
