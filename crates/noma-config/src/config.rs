//! Root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ApiConfig, ConfigError, LogFormat, LoggingConfig, ServerConfig};

/// Complete NoMa API configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use noma_config::NomaConfig;
///
/// let config = NomaConfig::default();
/// assert_eq!(config.api.base_path, "/api");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct NomaConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// API surface settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NomaConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if !self.api.base_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "api.base_path",
                format!("must start with '/': {}", self.api.base_path),
            ));
        }

        if self.api.static_endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "api.static_endpoints",
                "entries must not be empty",
            ));
        }

        if self.logging.enabled {
            noma_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Parses `server.http_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if it is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Local development preset: pretty debug logs on loopback.
    ///
    /// ```
    /// use noma_config::{LogFormat, NomaConfig};
    ///
    /// let config = NomaConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.api.trust_request_id = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(NomaConfig::default().validate().is_ok());
        assert!(NomaConfig::development().validate().is_ok());
        assert!(NomaConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = NomaConfig::default();
        config.server.http_addr = "not-an-address".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = NomaConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().unwrap_err().to_string().contains("request_timeout_ms"));

        let mut config = NomaConfig::default();
        config.server.shutdown_timeout_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("shutdown_timeout_secs"));
    }

    #[test]
    fn test_base_path_must_be_absolute() {
        let mut config = NomaConfig::default();
        config.api.base_path = "api".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("api.base_path"));
    }

    #[test]
    fn test_empty_static_endpoint_rejected() {
        let mut config = NomaConfig::default();
        config.api.static_endpoints.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected_only_when_enabled() {
        let mut config = NomaConfig::default();
        config.logging.level = "noma=loud".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = NomaConfig::development();
        assert_eq!(dev.logging.level, "debug");
        assert!(dev.logging.ansi_enabled);
        assert_eq!(dev.socket_addr().unwrap().port(), 8080);

        let prod = NomaConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(!prod.api.trust_request_id);
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let toml_str = toml::to_string_pretty(&NomaConfig::default()).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<NomaConfig, _> = toml::from_str("[metrics]\nenabled = true\n");
        assert!(result.is_err());
    }
}
