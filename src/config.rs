use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::InstallerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directories {
    #[serde(default = "default_packages_dir")]
    pub packages: PathBuf,

    #[serde(default = "default_desktop_entries_dir")]
    pub desktop_entries: PathBuf,
}

impl Default for Directories {
    fn default() -> Self {
        Directories {
            packages: default_packages_dir(),
            desktop_entries: default_desktop_entries_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_output: bool,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: default_log_level(),
            json_output: false,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directories: Directories,

    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    /// Loads `path` (or the default location), then applies environment
    /// overrides. A missing file yields the defaults.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os("APPINSTALL_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("appinstall").join("config.toml")))
            .unwrap_or_else(|| PathBuf::from("/etc/appinstall/config.toml"))
    }

    pub fn packages_dir(&self) -> PathBuf {
        expand_home(&self.directories.packages)
    }

    pub fn desktop_entries_dir(&self) -> PathBuf {
        expand_home(&self.directories.desktop_entries)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn json_output(&self) -> bool {
        self.logging.json_output
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(expand_home)
    }

    pub fn installer_config(&self) -> InstallerConfig {
        InstallerConfig::new(self.packages_dir(), self.desktop_entries_dir())
    }

    /// Command-line directory flags, which win over file and environment.
    pub fn override_directories(&mut self, packages: Option<PathBuf>, desktop_entries: Option<PathBuf>) {
        if let Some(dir) = packages {
            self.directories.packages = dir;
        }
        if let Some(dir) = desktop_entries {
            self.directories.desktop_entries = dir;
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("APPINSTALL_PACKAGES_DIR") {
            self.directories.packages = PathBuf::from(val);
        }
        if let Some(val) = lookup("APPINSTALL_DESKTOP_DIR") {
            self.directories.desktop_entries = PathBuf::from(val);
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.level = val;
        }
    }
}

/// Expands a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("~/AppImages")
}

fn default_desktop_entries_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("applications"))
        .unwrap_or_else(|| PathBuf::from("~/.local/share/applications"))
}

fn default_log_level() -> String {
    "warn".to_string()
}
