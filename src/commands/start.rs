use anyhow::{Context, Result};
use colored::Colorize;
use lawyer_office_api::{config, server};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads the configuration and serves until SIGTERM/SIGINT.
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting office API...".green());

    let cfg = config::load_config_from(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    info!(config = %config_path.display(), "Configuration loaded");

    server::start_server(cfg, config_path.to_path_buf()).await
}
