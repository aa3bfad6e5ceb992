//! Main entry point for the dictionary server.

use anyhow::Result;
use clap::Parser;
use dictionary_service::{cli, inspect, server, settings::Settings, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::Cli::parse();

    // Load settings
    let mut settings = Settings::load()?;

    // Initialize logging
    telemetry::init(&settings.logging)?;

    match args.command {
        cli::Commands::Serve { addr, data_file } => {
            if let Some(addr) = addr {
                settings.set_addr(&addr)?;
            }
            if let Some(data_file) = data_file {
                settings.storage.data_file = data_file;
            }
            settings.validate()?;

            server::serve(&settings).await?;
            Ok(())
        }
        cli::Commands::Inspect { data_file } => {
            let path = data_file.unwrap_or(settings.storage.data_file);
            inspect::run(&path, &mut std::io::stdout().lock())?;
            Ok(())
        }
    }
}
