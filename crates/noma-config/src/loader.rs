//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, NomaConfig};

/// Builds a [`NomaConfig`] from defaults, files and the environment.
///
/// A file replaces the whole configuration loaded so far; keys it omits
/// take their built-in defaults. Environment overrides are applied last,
/// then the result is validated.
///
/// # Example
///
/// ```
/// use noma_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: NomaConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: NomaConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = NomaConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = NomaConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed, has an unknown
    /// extension, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing_file(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Fails like [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Fails on malformed input or an unknown format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Loads `.env` from the working directory into the process environment.
    ///
    /// A missing file is not an error. Variables already set win.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a specific env file into the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or cannot be parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable override or an invalid final configuration.
    pub fn load(mut self) -> Result<NomaConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(k, _)| k.starts_with(&marker))
                .collect();

            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> NomaConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_override(key, "invalid key format"))?;

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_int(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_int(key, value)?;
            }

            ["API", "BASE_PATH"] => config.api.base_path = value.to_string(),
            ["API", "STATIC_ENDPOINTS"] => {
                config.api.static_endpoints = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["API", "INTERNAL_ERROR_MESSAGE"] => {
                config.api.internal_error_message = value.to_string();
            }
            ["API", "TRUST_REQUEST_ID"] => config.api.trust_request_id = parse_bool(key, value)?,

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::env_override(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "ANSI_ENABLED"] => config.logging.ansi_enabled = parse_bool(key, value)?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(key, value)?;
            }

            // Unrelated variables sharing the prefix
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<NomaConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_override(key, "expected integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_override(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, NomaConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let dev = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(dev.logging.format, LogFormat::Pretty);

        let prod = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(prod.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_with_string_json() {
        let json = r#"{"api": {"base_path": "/noma", "static_endpoints": []}}"#;
        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();
        assert_eq!(config.api.base_path, "/noma");
        assert!(config.api.static_endpoints.is_empty());
    }

    #[test]
    fn test_with_string_unknown_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_file_replaces_preset() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[server]\nrequest_timeout_ms = 500\n", "toml")
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.server.request_timeout_ms, 500);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new().with_file("/nonexistent/noma.toml").unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/noma.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_apply_env_server() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__SERVER__HTTP_ADDR", "127.0.0.1:9000", "T").unwrap();
        loader.apply_env_var("T__SERVER__REQUEST_TIMEOUT_MS", "250", "T").unwrap();
        loader.apply_env_var("T__SERVER__MAX_BODY_BYTES", "4096", "T").unwrap();

        assert_eq!(loader.config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(loader.config.server.request_timeout_ms, 250);
        assert_eq!(loader.config.server.max_body_bytes, 4096);
    }

    #[test]
    fn test_apply_env_api() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__API__STATIC_ENDPOINTS", "openapi, health,", "T").unwrap();
        loader.apply_env_var("T__API__TRUST_REQUEST_ID", "yes", "T").unwrap();

        assert_eq!(loader.config.api.static_endpoints, vec!["openapi", "health"]);
        assert!(loader.config.api.trust_request_id);
    }

    #[test]
    fn test_apply_env_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__LOGGING__FORMAT", "Pretty", "T").unwrap();
        loader.apply_env_var("T__LOGGING__ENABLED", "off", "T").unwrap();

        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert!(!loader.config.logging.enabled);
    }

    #[test]
    fn test_apply_env_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("T__SERVER__REQUEST_TIMEOUT_MS", "soon", "T").is_err());
        assert!(loader.apply_env_var("T__API__TRUST_REQUEST_ID", "maybe", "T").is_err());
        assert!(loader.apply_env_var("T__LOGGING__FORMAT", "xml", "T").is_err());
    }

    #[test]
    fn test_apply_env_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("T__CACHE__SIZE", "10", "T").unwrap();
        assert_eq!(loader.config, NomaConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        for raw in ["true", "TRUE", "1", "yes", "on"] {
            assert!(parse_bool("K", raw).unwrap());
        }
        for raw in ["false", "0", "no", "Off"] {
            assert!(!parse_bool("K", raw).unwrap());
        }
        assert!(parse_bool("K", "").is_err());
    }
}
