//! Pipeline configuration.
//!
//! Every section has defaults so a missing `slidecast.toml` still yields a
//! working pipeline. See [`loader::ConfigLoader`] for file discovery and
//! environment overrides.

pub mod loader;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use slidecast_model::ResourceKind;

use crate::error::ConfigError;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, ConfigWarnings};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    pub api: ApiConfig,
    pub gate: GateConfig,
    pub trackers: TrackerConfig,
    pub prefetch: PrefetchConfig,
    pub cache: CacheConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url).map_err(|err| {
            ConfigError::invalid("api.base_url", err.to_string())
        })?;
        if self.gate.max_requests == 0 {
            return Err(ConfigError::invalid(
                "gate.max_requests",
                "must be at least 1",
            ));
        }
        if self.gate.window_ms == 0 {
            return Err(ConfigError::invalid(
                "gate.window_ms",
                "must be at least 1",
            ));
        }
        if self.trackers.image_capacity == 0 {
            return Err(ConfigError::invalid(
                "trackers.image_capacity",
                "must be at least 1",
            ));
        }
        if self.trackers.video_capacity == 0 {
            return Err(ConfigError::invalid(
                "trackers.video_capacity",
                "must be at least 1",
            ));
        }
        for kind in ResourceKind::ALL {
            let horizon = self.cache.horizon(kind);
            if horizon.gc_secs < horizon.stale_secs {
                return Err(ConfigError::invalid(
                    format!("cache.{kind}"),
                    format!(
                        "gc_secs ({}) must not be shorter than stale_secs ({})",
                        horizon.gc_secs, horizon.stale_secs
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Remote content API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// First segment of every response cache key.
    pub namespace: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            namespace: "api".to_string(),
            user_agent: concat!("slidecast/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Admission gate limits: `max_requests` per trailing `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub image_capacity: usize,
    pub video_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            image_capacity: 10,
            video_capacity: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Initial lookahead used until the settings store says otherwise.
    pub preload_count: usize,
    pub enabled: bool,
    /// Leading bytes requested when preloading video metadata.
    pub video_probe_bytes: u64,
    /// Decode prefetched images to surface unsupported formats early.
    pub decode_images: bool,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            preload_count: 3,
            enabled: true,
            video_probe_bytes: 512 * 1024,
            decode_images: true,
        }
    }
}

/// Freshness and retention horizon for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheHorizon {
    /// After this an entry may be served but should be refreshed.
    pub stale_secs: u64,
    /// After this an entry is dropped.
    pub gc_secs: u64,
}

impl CacheHorizon {
    pub const fn minutes(stale: u64, gc: u64) -> Self {
        Self {
            stale_secs: stale * 60,
            gc_secs: gc * 60,
        }
    }

    pub fn stale(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn gc(&self) -> Duration {
        Duration::from_secs(self.gc_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub posts: CacheHorizon,
    pub search: CacheHorizon,
    pub entity: CacheHorizon,
    pub site_info: CacheHorizon,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            posts: CacheHorizon::minutes(2, 5),
            search: CacheHorizon::minutes(5, 10),
            entity: CacheHorizon::minutes(10, 30),
            site_info: CacheHorizon::minutes(30, 60),
        }
    }
}

impl CacheConfig {
    pub fn horizon(&self, kind: ResourceKind) -> CacheHorizon {
        match kind {
            ResourceKind::Posts => self.posts,
            ResourceKind::Search => self.search,
            ResourceKind::Entity => self.entity,
            ResourceKind::SiteInfo => self.site_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.gate.max_requests, 10);
        assert_eq!(config.trackers.video_capacity, 5);
        assert_eq!(
            config.cache.horizon(ResourceKind::Posts).stale(),
            Duration::from_secs(120)
        );
        assert_eq!(
            config.cache.horizon(ResourceKind::SiteInfo).gc(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gate]
            max_requests = 4

            [cache.search]
            stale_secs = 30
            gc_secs = 60

            [relay]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.gate.max_requests, 4);
        assert_eq!(config.gate.window_ms, 1_000);
        assert_eq!(config.cache.search.gc_secs, 60);
        assert_eq!(config.cache.posts, CacheHorizon::minutes(2, 5));
    }

    #[test]
    fn gc_shorter_than_stale_is_rejected() {
        let mut config = Config::default();
        config.cache.entity = CacheHorizon {
            stale_secs: 600,
            gc_secs: 60,
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache.entity"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = Config::default();
        config.gate.window_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.trackers.image_capacity = 0;
        assert!(config.validate().is_err());
    }
}
