//! Configuration loading and root folder resolution
//!
//! Root folder resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `SWIMCOACH_ROOT_FOLDER`
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file never aborts startup: a warning is
//! logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SWIMCOACH_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "swimcoach.db";

/// Default HTTP port for the service
pub const DEFAULT_PORT: u16 = 5730;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Contents of `config.toml`
///
/// Every field is optional; absent fields fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Public base URL used to build notification deep links
    pub app_url: Option<String>,
}

impl TomlConfig {
    /// Parse a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load the first config file found on this platform
    ///
    /// Returns defaults (all `None`) when no file exists or the file is broken.
    pub fn load_default() -> Self {
        for candidate in config_file_candidates() {
            if !candidate.exists() {
                continue;
            }
            match Self::from_file(&candidate) {
                Ok(config) => {
                    info!("Loaded configuration from {}", candidate.display());
                    return config;
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", candidate.display(), e);
                    return Self::default();
                }
            }
        }
        warn!("No config file found, using compiled defaults");
        Self::default()
    }
}

/// Candidate config file locations, most specific first
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("swimcoach").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/swimcoach/config.toml"));
    }
    candidates
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/swimcoach (or /var/lib/swimcoach for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("swimcoach"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/swimcoach"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("swimcoach"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/swimcoach"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("swimcoach"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\swimcoach"))
    } else {
        PathBuf::from("./swimcoach_data")
    }
}

/// Resolves the root folder holding the database
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml: TomlConfig,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml: TomlConfig::default(),
        }
    }

    /// Command-line override (priority 1)
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Loaded TOML configuration (priority 3)
    pub fn with_toml(mut self, toml: TomlConfig) -> Self {
        self.toml = toml;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml.root_folder {
            info!("{}: root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("{}: root folder from compiled default: {}", self.module_name, path.display());
        path
    }
}

/// Prepares the resolved root folder for use
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if it doesn't exist
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub app_url: String,
}

impl ServerConfig {
    /// Merge TOML values over compiled defaults
    pub fn from_toml(toml: &TomlConfig) -> Self {
        let host = toml.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = toml.port.unwrap_or(DEFAULT_PORT);
        let app_url = toml
            .app_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", host, port));
        Self {
            host,
            port,
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}
