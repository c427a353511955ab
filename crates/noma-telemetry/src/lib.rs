//! Structured logging for the NoMa API.
//!
//! Every crate in the workspace logs through `tracing`. This crate owns the
//! one-time subscriber setup and the request lifecycle macros, so a request
//! can be followed across stages by its `request_id`.
//!
//! # Example
//!
//! ```rust,ignore
//! use noma_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(endpoint = "contacts", "Registered endpoint");
//! ```

#![doc(html_root_url = "https://docs.rs/noma-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
