//! Typed configuration for the NoMa API.
//!
//! Configuration is layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults (or a [`NomaConfig::development`] /
//!    [`NomaConfig::production`] preset)
//! 2. A TOML or JSON file
//! 3. A `.env` file, loaded into the process environment
//! 4. `PREFIX__SECTION__KEY` environment variables
//!
//! Unknown fields in files are rejected.
//!
//! # Example
//!
//! ```no_run
//! use noma_config::ConfigLoader;
//!
//! # fn main() -> Result<(), noma_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("noma.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("NOMA")
//!     .load()?;
//!
//! println!("Listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [api]
//! base_path = "/api"
//! static_endpoints = ["openapi"]
//! internal_error_message = "An internal error occurred"
//! trust_request_id = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ansi_enabled = false
//! ```
//!
//! # Environment Overrides
//!
//! - `NOMA__SERVER__HTTP_ADDR=127.0.0.1:9000`
//! - `NOMA__API__STATIC_ENDPOINTS=openapi,health`
//! - `NOMA__LOGGING__LEVEL=noma_middleware=debug,info`

#![doc(html_root_url = "https://docs.rs/noma-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::NomaConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use noma_telemetry::LogFormat;
pub use schema::{ApiConfig, LoggingConfig, ServerConfig};
