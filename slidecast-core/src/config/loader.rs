use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

use super::Config;
use crate::error::ConfigError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("slidecast.toml"),
        PathBuf::from("config/slidecast.toml"),
    ]
});

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SLIDECAST_CONFIG";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
    pub env_file_loaded: bool,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env`, read the config file, apply `SLIDECAST_*` overrides and
    /// validate the result.
    pub fn load(&self) -> Result<ConfigLoad, ConfigError> {
        let env_file_loaded = self.load_env_file()?;
        let mut warnings = ConfigWarnings::default();

        let source = self.locate()?;
        let mut config = match &source {
            Some(path) => parse_file(path)?,
            None => {
                warnings.push_with_hint(
                    "No slidecast.toml detected; using built-in defaults",
                    "Create slidecast.toml or set SLIDECAST_CONFIG",
                );
                Config::default()
            }
        };

        apply_env_overrides(
            &mut config,
            |key| std::env::var(key).ok(),
            &mut warnings,
        )?;
        config.validate()?;

        Ok(ConfigLoad {
            config,
            source,
            env_file_loaded,
            warnings,
        })
    }

    /// Resolve the config file path.
    ///
    /// An explicit path (option or `SLIDECAST_CONFIG`) must exist; default
    /// locations are optional.
    pub fn locate(&self) -> Result<Option<PathBuf>, ConfigError> {
        let explicit = self.options.config_path.clone().or_else(|| {
            std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from)
        });

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingConfig { path });
            }
            return Ok(Some(path));
        }

        Ok(DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|candidate| candidate.exists())
            .cloned())
    }

    fn load_env_file(&self) -> Result<bool, ConfigError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Read the raw TOML document at `path`.
pub fn read_document(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        source: err,
    })
}

fn parse_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = read_document(path)?;
    toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Apply `SLIDECAST_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(
    config: &mut Config,
    lookup: F,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("SLIDECAST_API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(value) = lookup("SLIDECAST_GATE_MAX_REQUESTS") {
        config.gate.max_requests = parse_number("SLIDECAST_GATE_MAX_REQUESTS", &value)?;
    }
    if let Some(value) = lookup("SLIDECAST_GATE_WINDOW") {
        let window = humantime::parse_duration(&value).map_err(|err| {
            ConfigError::invalid("SLIDECAST_GATE_WINDOW", err.to_string())
        })?;
        config.gate.window_ms = u64::try_from(window.as_millis()).map_err(|err| {
            ConfigError::invalid("SLIDECAST_GATE_WINDOW", err.to_string())
        })?;
    }
    if let Some(value) = lookup("SLIDECAST_PRELOAD_COUNT") {
        config.prefetch.preload_count =
            parse_number("SLIDECAST_PRELOAD_COUNT", &value)?;
    }
    if let Some(value) = lookup("SLIDECAST_PREFETCH_ENABLED") {
        config.prefetch.enabled = parse_flag("SLIDECAST_PREFETCH_ENABLED", &value)?;
    }
    if let Some(value) = lookup("SLIDECAST_IMAGE_TRACKER_CAPACITY") {
        config.trackers.image_capacity =
            parse_number("SLIDECAST_IMAGE_TRACKER_CAPACITY", &value)?;
    }
    if let Some(value) = lookup("SLIDECAST_VIDEO_TRACKER_CAPACITY") {
        config.trackers.video_capacity =
            parse_number("SLIDECAST_VIDEO_TRACKER_CAPACITY", &value)?;
    }

    if config.prefetch.enabled && config.prefetch.preload_count == 0 {
        warnings.push(
            "prefetch is enabled but preload_count is 0; nothing will be preloaded",
        );
    }
    Ok(())
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::invalid(key, err.to_string()))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(
            key,
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config = Config::default();
        let mut warnings = ConfigWarnings::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("SLIDECAST_GATE_MAX_REQUESTS", "25"),
                ("SLIDECAST_GATE_WINDOW", "2s 500ms"),
                ("SLIDECAST_PREFETCH_ENABLED", "off"),
                ("SLIDECAST_VIDEO_TRACKER_CAPACITY", "8"),
            ]),
            &mut warnings,
        )
        .unwrap();

        assert_eq!(config.gate.max_requests, 25);
        assert_eq!(config.gate.window_ms, 2_500);
        assert!(!config.prefetch.enabled);
        assert_eq!(config.trackers.video_capacity, 8);
        assert!(warnings.is_empty());
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut config = Config::default();
        let err = apply_env_overrides(
            &mut config,
            lookup(&[("SLIDECAST_PRELOAD_COUNT", "many")]),
            &mut ConfigWarnings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SLIDECAST_PRELOAD_COUNT"));
    }

    #[test]
    fn window_past_millisecond_range_is_rejected() {
        let mut config = Config::default();
        let before = config.gate.window_ms;
        let err = apply_env_overrides(
            &mut config,
            lookup(&[("SLIDECAST_GATE_WINDOW", "1000000000years")]),
            &mut ConfigWarnings::default(),
        )
        .unwrap_err();

        assert!(matches!(
            &err,
            ConfigError::Invalid { key, .. } if key == "SLIDECAST_GATE_WINDOW"
        ));
        assert_eq!(config.gate.window_ms, before);
    }

    #[test]
    fn zero_lookahead_is_a_warning_not_an_error() {
        let mut config = Config::default();
        let mut warnings = ConfigWarnings::default();
        apply_env_overrides(
            &mut config,
            lookup(&[("SLIDECAST_PRELOAD_COUNT", "0")]),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(warnings.items.len(), 1);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let loader =
            ConfigLoader::new().with_config_path("/definitely/not/here.toml");
        assert!(matches!(
            loader.locate(),
            Err(ConfigError::MissingConfig { .. })
        ));
    }
}
