use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where database files live and how their pools behave.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one `<name>.db` SQLite file per database.
    /// TOML: `storage.data_dir`. Default: `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Create the database file on first access instead of failing.
    /// TOML: `storage.create_missing`. Default: `true`.
    #[serde(default = "default_true")]
    pub create_missing: bool,

    /// Connections per database pool.
    /// TOML: `storage.max_connections`. Default: `8`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// SQLite busy timeout.
    /// TOML: `storage.busy_timeout_secs`. Default: `5`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Close a database pool after this long without requests.
    /// TOML: `storage.idle_timeout_secs`. Default: `600`.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Upper bound on simultaneously open database pools.
    /// TOML: `storage.max_open_databases`. Default: `64`.
    #[serde(default = "default_max_open_databases")]
    pub max_open_databases: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            create_missing: true,
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_open_databases: default_max_open_databases(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_max_open_databases() -> u64 {
    64
}
