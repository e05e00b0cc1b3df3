// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # addsvc
//!
//! `addsvc serve` runs the HTTP server over the in-memory to-do store. Every
//! other subcommand calls a running instance through the remote-backed
//! endpoint set and prints the result.
//!
//! ## Commands
//!
//! - `addsvc serve [--listen ADDR]`
//! - `addsvc sum A B`, `addsvc concat A B`, `addsvc ping`
//! - `addsvc add TASK`, `addsvc complete ID`, `addsvc undo ID`,
//!   `addsvc delete ID`, `addsvc list`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use addsvc_cli::commands::{self, ClientCommand};
use addsvc_cli::telemetry;
use addsvc_core::infrastructure::telemetry::init_propagator;
use addsvc_core::ServiceConfig;

/// Arithmetic and to-do service
#[derive(Parser)]
#[command(name = "addsvc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ADDSVC_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ADDSVC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Remote instance for client commands (host:port or URL)
    #[arg(long, global = true, env = "ADDSVC_INSTANCE")]
    instance: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides config)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    #[command(flatten)]
    Client(ClientCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_logging(&cli.log_level)?;

    let mut config =
        ServiceConfig::load_or_default(cli.config).context("Failed to load configuration")?;
    init_propagator();

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            let tracer_provider = match &config.otlp_endpoint {
                Some(endpoint) => Some(telemetry::init_otlp(endpoint)?),
                None => None,
            };
            if let Some(addr) = &config.metrics_addr {
                telemetry::init_prometheus(addr)?;
            }

            let result = commands::serve::run(config).await;

            if let Some(provider) = tracer_provider {
                info!("Flushing spans");
                telemetry::shutdown_otlp(provider);
            }
            result
        }
        Commands::Client(command) => {
            if let Some(instance) = cli.instance {
                config.client.instance = instance;
            }
            commands::client::handle_command(command, &config.client).await
        }
    }
}
