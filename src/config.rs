use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Path to the version marker file
    pub version_path: ConfigValue<PathBuf>,
    /// Center assigned to seeded and CLI-created records
    pub default_center_id: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    version_path: Option<PathBuf>,
    default_center_id: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = Self::default_data_dir();

        let mut database_path =
            ConfigValue::new(data_dir.join("ledgerbox.db"), ConfigSource::Default);
        let mut version_path = ConfigValue::new(data_dir.join("version"), ConfigSource::Default);
        let mut default_center_id = ConfigValue::new("main".to_string(), ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                database_path = ConfigValue::new(resolve(&path, db_path), ConfigSource::File);
            }
            if let Some(marker) = file_config.version_path {
                version_path = ConfigValue::new(resolve(&path, marker), ConfigSource::File);
            }
            if let Some(center) = file_config.default_center_id {
                default_center_id = ConfigValue::new(center, ConfigSource::File);
            }
        }

        if let Ok(db_path) = std::env::var("LEDGERBOX_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(marker) = std::env::var("LEDGERBOX_VERSION_PATH") {
            version_path = ConfigValue::new(PathBuf::from(marker), ConfigSource::Environment);
        }
        if let Ok(center) = std::env::var("LEDGERBOX_CENTER_ID") {
            default_center_id = ConfigValue::new(center, ConfigSource::Environment);
        }

        if default_center_id.value.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "default_center_id",
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            database_path,
            version_path,
            default_center_id,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/ledgerbox/
    /// - macOS: ~/Library/Application Support/ledgerbox/
    /// - Windows: %APPDATA%/ledgerbox/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgerbox")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/ledgerbox/
    /// - macOS: ~/Library/Application Support/ledgerbox/
    /// - Windows: %APPDATA%/ledgerbox/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgerbox")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

/// Relative paths in the config file are relative to the file itself.
fn resolve(config_file: &Path, value: PathBuf) -> PathBuf {
    if value.is_relative() {
        config_file
            .parent()
            .map(|p| p.join(&value))
            .unwrap_or(value)
    } else {
        value
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, reason) => {
                write!(f, "Invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
