use crate::estimation::{GridWidth, SeriesLayout};
use crate::sheets::google::DEFAULT_BASE_URL;
use crate::store::postgrest::DEFAULT_TABLE;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_SHEETS_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SHEETS_TOKEN_ENV: &str = "GOOGLE_SHEETS_TOKEN";
pub const DEFAULT_STORE_KEY_ENV: &str = "SUPABASE_KEY";
pub const DEFAULT_SERVICE_KEY_ENV: &str = "SERVICE_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub occupancy: Option<OccupancySection>,
    #[serde(default)]
    pub sheets: Option<SheetsSection>,
    #[serde(default)]
    pub store: Option<StoreSection>,
    #[serde(default)]
    pub auth: Option<AuthSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 3000)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OccupancySection {
    /// Bucket width in minutes, 5 or 15 (default: 15)
    pub grid_minutes: Option<GridWidth>,
    /// First historical reading of the day; defaults follow the grid width
    pub start_hour: Option<u32>,
    pub start_minute: Option<u32>,
    /// IANA zone the wall clock is read in (default: America/New_York)
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsSection {
    pub base_url: Option<String>,
    pub spreadsheet_id: String,
    /// Environment variable holding the API token
    pub token_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Postgrest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSection {
    #[serde(default)]
    pub kind: StoreKind,
    pub url: Option<String>,
    pub table: Option<String>,
    /// Environment variable holding the gateway key
    pub key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSection {
    /// Environment variable holding the key expected in `x-ilefa-key`
    pub service_key_env: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown timezone: {0}")]
    Timezone(String),
    #[error("invalid series start {hour:02}:{minute:02}")]
    SeriesStart { hour: u32, minute: u32 },
    #[error("missing setting: {0}")]
    Missing(&'static str),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// Read a secret from the environment; unset or blank is `None`.
pub fn secret_from_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Returns the server port (default: 3000)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn series_layout(&self) -> Result<SeriesLayout, ConfigError> {
        let section = self.occupancy.as_ref();
        let grid = section
            .and_then(|s| s.grid_minutes)
            .unwrap_or(GridWidth::Fifteen);
        let mut layout = SeriesLayout::for_grid(grid);
        if let Some(hour) = section.and_then(|s| s.start_hour) {
            layout.start_hour = hour;
        }
        if let Some(minute) = section.and_then(|s| s.start_minute) {
            layout.start_minute = minute;
        }
        if layout.start_hour > 23 || layout.start_minute > 59 {
            return Err(ConfigError::SeriesStart {
                hour: layout.start_hour,
                minute: layout.start_minute,
            });
        }
        Ok(layout)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        let name = self
            .occupancy
            .as_ref()
            .and_then(|s| s.timezone.as_deref())
            .unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(name.to_string()))
    }

    pub fn sheets_base_url(&self) -> &str {
        self.sheets
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn spreadsheet_id(&self) -> Result<&str, ConfigError> {
        self.sheets
            .as_ref()
            .map(|s| s.spreadsheet_id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::Missing("sheets.spreadsheet_id"))
    }

    pub fn sheets_token_env(&self) -> &str {
        self.sheets
            .as_ref()
            .and_then(|s| s.token_env.as_deref())
            .unwrap_or(DEFAULT_SHEETS_TOKEN_ENV)
    }

    /// Returns the source request timeout (default: 10 seconds)
    pub fn sheets_timeout(&self) -> Duration {
        let secs = self
            .sheets
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .unwrap_or(DEFAULT_SHEETS_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.as_ref().map(|s| s.kind).unwrap_or_default()
    }

    pub fn store_url(&self) -> Result<&str, ConfigError> {
        self.store
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("store.url"))
    }

    pub fn store_table(&self) -> &str {
        self.store
            .as_ref()
            .and_then(|s| s.table.as_deref())
            .unwrap_or(DEFAULT_TABLE)
    }

    pub fn store_key_env(&self) -> &str {
        self.store
            .as_ref()
            .and_then(|s| s.key_env.as_deref())
            .unwrap_or(DEFAULT_STORE_KEY_ENV)
    }

    pub fn service_key_env(&self) -> &str {
        self.auth
            .as_ref()
            .and_then(|a| a.service_key_env.as_deref())
            .unwrap_or(DEFAULT_SERVICE_KEY_ENV)
    }
}
