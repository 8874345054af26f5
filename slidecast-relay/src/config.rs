//! `[relay]` section of `slidecast.toml`.
//!
//! File discovery is shared with the core loader; only the relay table is
//! read here and every other table is ignored.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slidecast_core::config::ConfigLoader;
use slidecast_core::config::loader::read_document;
use slidecast_core::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub user_agent: String,
    /// Upstream connect timeout. Body transfer is not time limited.
    pub connect_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            user_agent: concat!("slidecast-relay/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl RelayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RelayDocument {
    #[serde(default)]
    relay: RelayConfig,
}

#[derive(Debug)]
pub struct RelayConfigLoad {
    pub config: RelayConfig,
    pub source: Option<PathBuf>,
}

/// Read the relay table from `explicit` or the default config locations.
/// A missing default file yields the built-in defaults.
pub fn load_relay_config(
    explicit: Option<PathBuf>,
) -> Result<RelayConfigLoad, ConfigError> {
    let loader = match explicit {
        Some(path) => ConfigLoader::new().with_config_path(path),
        None => ConfigLoader::new(),
    };

    let Some(path) = loader.locate()? else {
        return Ok(RelayConfigLoad {
            config: RelayConfig::default(),
            source: None,
        });
    };

    let contents = read_document(&path)?;
    let document: RelayDocument =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
    if document.relay.port == 0 {
        return Err(ConfigError::invalid("relay.port", "must not be 0"));
    }

    Ok(RelayConfigLoad {
        config: document.relay,
        source: Some(path),
    })
}
