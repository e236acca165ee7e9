//! Iris classifier CLI
//!
//! A command-line tool for classifying measurements, inspecting the served
//! model and triggering retrains.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{classify, health, model};

/// Iris classifier CLI
#[derive(Parser)]
#[command(name = "irisctl")]
#[command(author, version, about = "CLI for the Iris classifier service", long_about = None)]
pub struct Cli {
    /// Public API URL (can also be set via IRIS_API_URL env var)
    #[arg(long, env = "IRIS_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Admin API URL (can also be set via IRIS_ADMIN_URL env var)
    #[arg(long, env = "IRIS_ADMIN_URL", default_value = "http://127.0.0.1:9091")]
    pub admin_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a flower from its measurements (cm)
    #[command(allow_negative_numbers = true)]
    Predict {
        sepal_length: f64,
        sepal_width: f64,
        petal_length: f64,
        petal_width: f64,
    },

    /// Retrain the model now and wait for it to be published
    Retrain,

    /// Show the model currently being served
    Model,

    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            let request = client::IrisRequest {
                sepal_length,
                sepal_width,
                petal_length,
                petal_width,
            };
            classify::predict(&client, request, cli.format).await?;
        }
        Commands::Retrain => {
            let client = client::ApiClient::new(&cli.admin_url)?;
            model::retrain(&client, cli.format).await?;
        }
        Commands::Model => {
            let client = client::ApiClient::new(&cli.admin_url)?;
            model::show_model(&client, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            health::show_health(&client, cli.format).await?;
        }
    }

    Ok(())
}
