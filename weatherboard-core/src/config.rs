use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, path::PathBuf};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "WEATHERBOARD_API_KEY";

/// Value shipped in sample configs; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

const DATABASE_FILE: &str = "GameData.db";

/// The provider credential handed to the weather fetcher.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiConfig {
    pub key: String,
}

impl ApiConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// A key is usable when it is non-empty and not the sample placeholder.
    pub fn is_configured(&self) -> bool {
        let key = self.key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }
}

// Keep the key out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    #[serde(default)]
    pub api_key: String,

    /// Overrides the OpenWeather current-conditions endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScoresConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [scores]
/// database_path = "/tmp/GameData.db"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub scores: ScoresConfig,
}

impl Config {
    /// Load config from the platform config directory, or an empty default on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the high-score database lives: the configured path, else the app data dir.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.scores.database_path {
            return Ok(path.clone());
        }

        Ok(project_dirs()?.data_dir().join(DATABASE_FILE))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.weather.api_key = api_key;
    }

    /// API credential, with `WEATHERBOARD_API_KEY` taking precedence over the file.
    pub fn api_config(&self) -> ApiConfig {
        self.api_config_with_override(std::env::var(API_KEY_ENV).ok())
    }

    fn api_config_with_override(&self, env_key: Option<String>) -> ApiConfig {
        match env_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => ApiConfig::new(key),
            None => ApiConfig::new(self.weather.api_key.clone()),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weatherboard", "weatherboard")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
