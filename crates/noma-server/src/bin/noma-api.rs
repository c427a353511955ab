//! The NoMa API daemon.
//!
//! Configuration is layered: defaults, then `.env`, then the file named by
//! `NOMA_CONFIG` (or `noma.toml` if present), then `NOMA__*` variables.

use anyhow::Context;
use noma_config::ConfigLoader;
use noma_server::Server;

const CONFIG_ENV: &str = "NOMA_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "noma.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    loader = match std::env::var(CONFIG_ENV) {
        Ok(path) => loader
            .with_file(&path)
            .with_context(|| format!("failed to load {CONFIG_ENV}={path}"))?,
        Err(_) => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader.with_env_prefix("NOMA").load()?;

    noma_telemetry::init_logging(&config.logging.to_log_config())?;
    tracing::info!(
        addr = %config.server.http_addr,
        base_path = %config.api.base_path,
        "Starting NoMa API"
    );

    let registry = noma_endpoints::v1_registry(&config.api.base_path);
    Server::from_config(&config, registry)?.run().await?;
    Ok(())
}
