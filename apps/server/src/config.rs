//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_PORT=8080                                                    │
//! │     TALLY_STORE_BACKEND=sqlite                                         │
//! │     TALLY_DATABASE_PATH=/var/lib/tally/tally.db                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else ./tally.toml, else                           │
//! │     ~/.config/tally-erp/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.erp/tally.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     in-memory store seeded with the demo dataset, port 3000            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1"
//! port = 3000
//!
//! [store]
//! backend = "sqlite"          # memory | sqlite
//! database_path = "tally.db"  # sqlite only; default is the platform data dir
//! max_connections = 5
//! seed_mock_data = true       # load the demo dataset into an empty store
//!
//! [ledger]
//! accrue_customer_sales = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name looked up in the working directory and the config dir.
pub const CONFIG_FILE_NAME: &str = "tally.toml";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Store Backend
// =============================================================================

/// Where records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local lists, lost on restart.
    #[default]
    Memory,

    /// SQLite file through tally-db repositories.
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mock" => Ok(StoreBackend::Memory),
            "sqlite" | "db" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::Invalid(format!(
                "Unknown store backend: '{}'. Valid options: memory, sqlite",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// `bind_addr:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Load the demo dataset when the store starts out empty.
    #[serde(default = "default_true")]
    pub seed_mock_data: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            backend: StoreBackend::default(),
            database_path: None,
            max_connections: default_max_connections(),
            seed_mock_data: true,
        }
    }
}

impl StoreSettings {
    /// The configured SQLite path, or `<data dir>/tally.db`.
    pub fn resolved_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "tally", "erp")
            .map(|dirs| dirs.data_dir().join("tally.db"))
            .unwrap_or_else(|| PathBuf::from("tally.db"))
    }
}

/// Ledger behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// When true, recorded sales add to the customer's `total_sales` and the
    /// amount paid with them to `amount_received`. When false, only
    /// explicit payments touch customer balances.
    #[serde(default)]
    pub accrue_customer_sales: bool,
}

// =============================================================================
// App Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `./tally.toml`, or the config dir)
    /// 3. `TALLY_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::discover_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        info!(
            backend = %config.store.backend,
            addr = %config.server.bind_address(),
            accrue_customer_sales = config.ledger.accrue_customer_sales,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses one TOML file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind_addr must not be empty".into()));
        }

        if self.store.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "store.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(path) = &self.store.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("store.database_path must not be empty".into()));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    ///
    /// Values that do not parse are logged and ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("TALLY_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("TALLY_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid TALLY_PORT"),
            }
        }

        if let Some(backend) = lookup("TALLY_STORE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding store backend from environment");
                    self.store.backend = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring invalid TALLY_STORE_BACKEND"),
            }
        }

        if let Some(path) = lookup("TALLY_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("TALLY_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.store.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid TALLY_MAX_CONNECTIONS"),
            }
        }

        if let Some(seed) = lookup("TALLY_SEED_MOCK_DATA") {
            match parse_flag(&seed) {
                Some(flag) => self.store.seed_mock_data = flag,
                None => warn!(value = %seed, "Ignoring invalid TALLY_SEED_MOCK_DATA"),
            }
        }

        if let Some(accrue) = lookup("TALLY_ACCRUE_CUSTOMER_SALES") {
            match parse_flag(&accrue) {
                Some(flag) => self.ledger.accrue_customer_sales = flag,
                None => warn!(value = %accrue, "Ignoring invalid TALLY_ACCRUE_CUSTOMER_SALES"),
            }
        }
    }

    /// `./tally.toml` if present, else the platform config directory.
    fn discover_config_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        directories::ProjectDirs::from("com", "tally", "erp")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
