//! Telemetry CLI - Command-line tool for vehicle telemetry
//!
//! Reads linked vehicles and their signals from a telemetry server.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use telemetry_client::{SignalKind, TelemetryClient};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "telemetry-cli")]
#[command(author, version, about = "Vehicle Telemetry CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL [default: http://localhost:8080]
    #[arg(short, long, env = "TELEMETRY_SERVER")]
    server: Option<String>,

    /// User whose vehicles are read
    #[arg(short, long, env = "TELEMETRY_USER")]
    user: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "TELEMETRY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL that links a user's vehicles
    LoginUrl,

    /// List linked vehicles
    Vehicles,

    /// Read one signal of a vehicle
    Signal {
        /// Vehicle ID
        vehicle: String,

        /// Signal: location, odometer, state-of-charge, nominal-capacity,
        /// charge-limits, battery, latest-signals
        kind: SignalKind,
    },

    /// Show every signal the server last stored for a vehicle
    Signals {
        /// Vehicle ID
        vehicle: String,
    },

    /// Read all fixed signals of a vehicle at once
    Dashboard {
        /// Vehicle ID
        vehicle: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.server.as_deref(),
        cli.user.as_deref(),
        cli.output.map(Into::into),
        cli.no_color,
    );

    // Create output context
    let format = OutputFormat::parse(&merged.output)?;
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    debug!("Using server {} with {:?}", merged.server, merged.timeout);
    let client = create_client(&merged)?;
    let user_id = merged.require_user()?;

    // Execute command
    match &cli.command {
        Commands::LoginUrl => {
            commands::login_url(&client, user_id, &ctx)?;
        }

        Commands::Vehicles => {
            commands::vehicles(&client, user_id, &ctx).await?;
        }

        Commands::Signal { vehicle, kind } => {
            commands::signal(&client, user_id, vehicle, *kind, &ctx).await?;
        }

        Commands::Signals { vehicle } => {
            commands::signals(&client, user_id, vehicle, &ctx).await?;
        }

        Commands::Dashboard { vehicle } => {
            commands::dashboard(&client, user_id, vehicle, &ctx).await?;
        }
    }

    Ok(())
}

/// Create a telemetry client from the resolved configuration
fn create_client(merged: &MergedConfig) -> Result<TelemetryClient> {
    TelemetryClient::with_config(&merged.server, &merged.client_config())
        .with_context(|| format!("Failed to create telemetry client for {}", merged.server))
}

// Implement conversion for OutputFormat to string (for config merge)
impl From<OutputFormat> for &str {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}
