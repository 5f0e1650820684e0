//! Client configuration

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use tracing_subscriber::filter::Directive;
use viaggi_session::{Api, Settings};

/// Logging output format
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Logging {
    /// Additional filtering directives
    #[serde(default, deserialize_with = "Logging::deserialize_filters")]
    pub filters: Vec<Directive>,

    /// Logging format
    #[serde(default)]
    pub format: LogFormat,
}

impl Logging {
    fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<Directive>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let dirs: Vec<String> = Deserialize::deserialize(deserializer)?;
        dirs.into_iter()
            .map(|dir| dir.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Where the session token is persisted
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Storage {
    /// Nothing survives the process, useful for trying things out
    Memory,

    /// Token kept in a file inside `path`
    File {
        /// Storage directory, platform data directory if not given
        #[serde(default)]
        path: Option<PathBuf>,
    },

    /// Token kept in a SQLite database
    Sqlite {
        /// Database file
        path: PathBuf,

        /// Connection pool size
        #[serde(default = "Storage::default_max_connections")]
        max_connections: u32,

        /// Run migrations on start
        #[serde(default = "Storage::default_migrate")]
        migrate: bool,
    },
}

impl Storage {
    fn default_max_connections() -> u32 {
        1
    }

    fn default_migrate() -> bool {
        true
    }

    /// Default directory for the file storage
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("viaggi")
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::File { path: None }
    }
}

/// Top level client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Storefront backend
    #[serde(default = "Config::default_api")]
    pub api: Api,

    /// Session settings
    #[serde(default)]
    pub session: Settings,

    /// Token storage
    #[serde(default)]
    pub storage: Storage,

    /// Logging configuration
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    fn default_api() -> Api {
        Api::new("http://localhost:8080")
    }
}
