//! # NoMa Server
//!
//! HTTP host for the NoMa API pipeline.
//!
//! This crate provides the server infrastructure in front of the pipeline:
//!
//! - HTTP/1.1 via Hyper, one task per connection
//! - Host-side URL routing under the configured base path
//! - Request body limits and per-request deadlines
//! - Graceful shutdown with connection draining
//! - A `/health` endpoint outside the pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use noma_config::ConfigLoader;
//! use noma_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env_prefix("NOMA").load()?;
//!     let registry = noma_endpoints::v1_registry(&config.api.base_path);
//!
//!     Server::from_config(&config, registry)?.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/noma-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod host;
mod server;
mod shutdown;

pub use error::{ServerError, ServerResult};
pub use host::{accepts_json, HostRouter};
pub use server::{pipeline_options, Server, HEALTH_PATH};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
