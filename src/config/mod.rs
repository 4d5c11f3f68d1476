mod basic;
mod storage;

pub use basic::BasicConfig;
pub use storage::StorageConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Database file and pool settings (see `storage` table in config.toml).
    #[serde(default)]
    pub storage: StorageConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Format as WireFormat;

    #[test]
    fn defaults_survive_a_figment_round_trip() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .expect("extract defaults");
        assert_eq!(cfg.basic.listen_port, 8188);
        assert_eq!(cfg.basic.default_format, WireFormat::Json);
        assert!(cfg.storage.create_missing);
    }

    #[test]
    fn toml_overrides_nested_tables() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                default_format = "csv"
                enable_sql = false

                [storage]
                data_dir = "/var/lib/webstore"
                max_connections = 2
                "#,
            ))
            .extract()
            .expect("extract overrides");
        assert_eq!(cfg.basic.default_format, WireFormat::Csv);
        assert!(!cfg.basic.enable_sql);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("/var/lib/webstore"));
        assert_eq!(cfg.storage.max_connections, 2);
        assert_eq!(cfg.storage.busy_timeout_secs, 5);
    }
}
