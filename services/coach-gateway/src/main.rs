//! Coach Gateway CLI
//!
//! Headless shell around the gateway: probe the backend, dump reference
//! catalogs, or watch connectivity.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use coach_gateway::types::ReferenceResource;
use coach_gateway::{load_config, Config, GatewayBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "coach-gateway")]
#[command(about = "Backend gateway for the health coach client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the backend once and print online/offline
    Probe,
    /// Fetch a reference catalog and print it as JSON
    References {
        /// symptoms, diseases or treatments
        resource: ReferenceResource,
    },
    /// Log connectivity transitions until ctrl-c
    Watch,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.backend.base_url = base_url;
    }

    match args.command {
        Command::Probe => {
            let backend = GatewayBuilder::new(config).build()?;
            match backend.gateway.probe().await {
                Ok(()) => {
                    println!("online");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::debug!("Probe failed: {}", e);
                    println!("offline");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::References { resource } => {
            let backend = GatewayBuilder::new(config).build()?;
            let list = backend.gateway.reference_list(resource).await?;
            println!("{}", serde_json::to_string_pretty(&*list)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch => {
            tracing::info!("Watching {}", config.backend.base_url);
            coach_gateway::watch(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
