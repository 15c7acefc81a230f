use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use lawyer_office_api::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Logging settings come from the config file when it loads; a broken file
    // is still reported through a default subscriber.
    match config::load_config_from(&args.config) {
        Ok(cfg) => init_tracing(&cfg.server.log_level, &cfg.server.log_format),
        Err(_) => init_tracing("info", "pretty"),
    }

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("Lawyer Office API v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
