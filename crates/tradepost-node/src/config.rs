//! Node configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tradepost_store::relay::DEFAULT_CAPACITY;

pub const ADDR_VAR: &str = "TRADEPOST_ADDR";
pub const LOG_VAR: &str = "TRADEPOST_LOG";
pub const DATA_FILE_VAR: &str = "TRADEPOST_DATA_FILE";
pub const EVENT_CAPACITY_VAR: &str = "TRADEPOST_EVENT_CAPACITY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Address the HTTP server binds to
    pub addr: SocketAddr,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Snapshot loaded at startup and written at shutdown
    pub data_file: Option<PathBuf>,
    /// Events buffered per live subscriber
    pub event_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            data_file: None,
            event_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let value = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = match value(ADDR_VAR) {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: ADDR_VAR,
                message: e.to_string(),
            })?,
            None => defaults.addr,
        };

        let event_capacity = match value(EVENT_CAPACITY_VAR) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: EVENT_CAPACITY_VAR,
                        message: "must be greater than zero".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: EVENT_CAPACITY_VAR,
                        message: e.to_string(),
                    })
                }
            },
            None => defaults.event_capacity,
        };

        Ok(Self {
            addr,
            log_level: value(LOG_VAR).unwrap_or(defaults.log_level),
            data_file: value(DATA_FILE_VAR).map(PathBuf::from),
            event_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<NodeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ADDR_VAR, "127.0.0.1:8080"),
            (LOG_VAR, "debug"),
            (DATA_FILE_VAR, "/tmp/market.json"),
            (EVENT_CAPACITY_VAR, "16"),
        ])
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/market.json")));
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        assert!(matches!(
            load(&[(ADDR_VAR, "not an address")]),
            Err(ConfigError::Invalid { var: ADDR_VAR, .. })
        ));
        assert!(load(&[(EVENT_CAPACITY_VAR, "0")]).is_err());
        assert!(load(&[(EVENT_CAPACITY_VAR, "many")]).is_err());
    }
}
