use crate::formats::Format;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// TOML: `basic.listen_port`. Default: `8188`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Format used when neither a path suffix nor `Accept` selects one.
    /// TOML: `basic.default_format`. Default: `json`.
    #[serde(default)]
    pub default_format: Format,

    /// Largest accepted request body, in bytes.
    /// TOML: `basic.max_body_bytes`. Default: 16 MiB.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Route `PUT /db/{database}` to raw SQL execution.
    /// TOML: `basic.enable_sql`. Default: `true`.
    #[serde(default = "default_enable_sql")]
    pub enable_sql: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            loglevel: "info".to_string(),
            default_format: Format::default(),
            max_body_bytes: default_max_body_bytes(),
            enable_sql: default_enable_sql(),
        }
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    8188
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_enable_sql() -> bool {
    true
}
