//! Errors raised while assembling a [`NomaConfig`](crate::NomaConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration layer could not be applied, or the result is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required config file (e.g. the one named by `NOMA_CONFIG`) is absent.
    #[error("config file {path} does not exist")]
    MissingFile {
        /// Requested path.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A TOML layer did not match the schema.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSON layer did not match the schema.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file was found but is malformed.
    #[error("cannot load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A merged value failed validation.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted key, e.g. `server.http_addr`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `PREFIX__SECTION__KEY` override names an unknown key or has a bad value.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub(crate) fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Reports `field` as failing validation.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::missing_file("/etc/noma/noma.toml");
        assert_eq!(err.to_string(), "config file /etc/noma/noma.toml does not exist");
    }

    #[test]
    fn test_invalid_names_field() {
        let err = ConfigError::invalid("server.http_addr", "not a socket address");
        assert_eq!(err.to_string(), "server.http_addr: not a socket address");
    }

    #[test]
    fn test_env_override_names_variable() {
        let err = ConfigError::env_override("NOMA__SERVER__REQUEST_TIMEOUT_MS", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment override NOMA__SERVER__REQUEST_TIMEOUT_MS: expected integer"
        );
    }
}
