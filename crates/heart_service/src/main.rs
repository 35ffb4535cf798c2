//! Heart Disease Prediction Service
//!
//! Loads a pre-trained heart disease classifier and serves single-record
//! predictions over HTTP.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::ServiceConfig;
use heart_service::commands;
use tracing_subscriber::EnvFilter;

/// Heart Disease Prediction Service
#[derive(Parser)]
#[command(name = "heart-service")]
#[command(about = "Serves heart disease risk predictions from a trained classifier")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Command to run (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve predictions over HTTP
    Serve {
        /// Directory containing `heart_model.mpk` and `heart_columns.json`
        #[arg(short, long, value_name = "DIR")]
        artifacts: Option<PathBuf>,

        /// Address to bind to
        #[arg(short, long)]
        bind: Option<IpAddr>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Predict a single JSON feature record and print the result
    Predict {
        /// Path to a JSON object of feature values
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Directory containing `heart_model.mpk` and `heart_columns.json`
        #[arg(short, long, value_name = "DIR")]
        artifacts: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServiceConfig::from_env()?;

    let command = cli.command.unwrap_or(Commands::Serve {
        artifacts: None,
        bind: None,
        port: None,
    });

    match command {
        Commands::Serve {
            artifacts,
            bind,
            port,
        } => {
            if let Some(dir) = artifacts {
                config.artifact_dir = dir;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }
            commands::serve::run(&config).await?;
        }
        Commands::Predict { input, artifacts } => {
            if let Some(dir) = artifacts {
                config.artifact_dir = dir;
            }
            commands::predict::run(&config, &input)?;
        }
    }

    Ok(())
}
