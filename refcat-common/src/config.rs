//! Configuration loading
//!
//! Resolution order (highest priority first):
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: a warning is logged and the
//! compiled defaults are used. A malformed file is an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{Error, Result};

pub const ENV_ZOTERO_KEY: &str = "ZOTERO_KEY";
pub const ENV_ZOTERO_LIBRARY_TYPE: &str = "ZOTERO_LIBRARY_TYPE";
pub const ENV_ZOTERO_LIBRARY_ID: &str = "ZOTERO_LIBRARY_ID";
pub const ENV_CRON_SECRET: &str = "CRON_SECRET";
pub const ENV_BIND: &str = "REFCAT_BIND";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5730";
pub const DEFAULT_ZOTERO_BASE_URL: &str = "https://api.zotero.org";

/// Kind of upstream library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    User,
    #[default]
    Group,
}

impl LibraryType {
    /// URL path segment ("users" / "groups")
    pub fn path_segment(&self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryType::User => f.write_str("user"),
            LibraryType::Group => f.write_str("group"),
        }
    }
}

impl FromStr for LibraryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(LibraryType::User),
            "group" => Ok(LibraryType::Group),
            other => Err(Error::Config(format!(
                "Invalid library type '{}' (expected 'user' or 'group')",
                other
            ))),
        }
    }
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoteroSettings {
    pub api_key: Option<String>,
    pub library_type: LibraryType,
    pub library_id: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ZoteroSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            library_type: LibraryType::Group,
            library_id: None,
            base_url: DEFAULT_ZOTERO_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Validated credentials for the upstream library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoteroCredentials {
    pub api_key: String,
    pub library_type: LibraryType,
    pub library_id: String,
}

impl ZoteroSettings {
    /// Require an API key and library id
    pub fn credentials(&self) -> Result<ZoteroCredentials> {
        let api_key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
        let library_id = self.library_id.as_deref().map(str::trim).filter(|k| !k.is_empty());

        match (api_key, library_id) {
            (Some(api_key), Some(library_id)) => Ok(ZoteroCredentials {
                api_key: api_key.to_string(),
                library_type: self.library_type,
                library_id: library_id.to_string(),
            }),
            _ => Err(Error::Config(format!(
                "Missing Zotero credentials. Please set {} and {} (or [zotero] api_key and \
                 library_id in the config file)",
                ENV_ZOTERO_KEY, ENV_ZOTERO_LIBRARY_ID
            ))),
        }
    }
}

/// Version store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStoreBackend {
    /// Single JSON file rewritten on every update
    #[default]
    File,
    /// SQLite table with per-key compare-and-swap
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionStoreConfig {
    pub backend: VersionStoreBackend,
    pub path: Option<PathBuf>,
}

impl VersionStoreConfig {
    /// Configured path or the backend's default file name
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| match self.backend {
            VersionStoreBackend::File => PathBuf::from(".zotero-versions.json"),
            VersionStoreBackend::Sqlite => PathBuf::from("refcat.db"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Full service configuration as read from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_addr: String,
    pub zotero: ZoteroSettings,
    /// Bearer token required by the poll endpoint; open access when unset
    pub cron_secret: Option<String>,
    /// Collection keys checked by the poll endpoint
    pub watched_collections: Vec<String>,
    /// Maximum items fetched per collection
    pub fetch_limit: usize,
    pub cache_ttl_secs: u64,
    pub version_store: VersionStoreConfig,
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            zotero: ZoteroSettings::default(),
            cron_secret: None,
            watched_collections: Vec::new(),
            fetch_limit: 10_000,
            cache_ttl_secs: 3600,
            version_store: VersionStoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(key) = env_value(ENV_ZOTERO_KEY) {
            self.zotero.api_key = Some(key);
        }
        if let Some(library_type) = env_value(ENV_ZOTERO_LIBRARY_TYPE) {
            self.zotero.library_type = library_type.parse()?;
        }
        if let Some(library_id) = env_value(ENV_ZOTERO_LIBRARY_ID) {
            self.zotero.library_id = Some(library_id);
        }
        if let Some(secret) = env_value(ENV_CRON_SECRET) {
            self.cron_secret = Some(secret);
        }
        if let Some(bind) = env_value(ENV_BIND) {
            self.bind_addr = bind;
        }
        Ok(())
    }

    /// Cron secret, ignoring blank values
    pub fn cron_secret(&self) -> Option<&str> {
        self.cron_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Trimmed, non-empty environment value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Platform config file location (`~/.config/refcat/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refcat").join("config.toml"))
}

/// Read a TOML config file, falling back to defaults when it is missing
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load the config file (explicit path or platform default) and apply env overrides
pub fn load_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match explicit_path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => {
            warn!("Could not determine config directory, using compiled defaults");
            TomlConfig::default()
        }
    };
    config.apply_env_overrides()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_type_parsing() {
        assert_eq!("user".parse::<LibraryType>().unwrap(), LibraryType::User);
        assert_eq!(" Group ".parse::<LibraryType>().unwrap(), LibraryType::Group);
        assert!("team".parse::<LibraryType>().is_err());
        assert_eq!(LibraryType::User.path_segment(), "users");
    }

    #[test]
    fn test_credentials_require_key_and_id() {
        let mut settings = ZoteroSettings::default();
        assert!(settings.credentials().is_err());

        settings.api_key = Some("secret".to_string());
        settings.library_id = Some("  ".to_string());
        assert!(settings.credentials().is_err());

        settings.library_id = Some("12345".to_string());
        let credentials = settings.credentials().unwrap();
        assert_eq!(credentials.library_id, "12345");
        assert_eq!(credentials.library_type, LibraryType::Group);
    }

    #[test]
    fn test_version_store_default_paths() {
        let file = VersionStoreConfig::default();
        assert_eq!(file.resolved_path(), PathBuf::from(".zotero-versions.json"));

        let sqlite = VersionStoreConfig {
            backend: VersionStoreBackend::Sqlite,
            path: None,
        };
        assert_eq!(sqlite.resolved_path(), PathBuf::from("refcat.db"));
    }

    #[test]
    fn test_blank_cron_secret_is_none() {
        let mut config = TomlConfig::default();
        assert!(config.cron_secret().is_none());
        config.cron_secret = Some("   ".to_string());
        assert!(config.cron_secret().is_none());
        config.cron_secret = Some("token".to_string());
        assert_eq!(config.cron_secret(), Some("token"));
    }
}
