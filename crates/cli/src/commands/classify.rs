//! Prediction command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, IrisRequest};
use crate::output::{color_percent, print_json, OutputFormat};

/// Classify one flower measurement
pub async fn predict(client: &ApiClient, request: IrisRequest, format: OutputFormat) -> Result<()> {
    let response = client.classify(&request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            println!(
                "{} ({} confidence)",
                response.species.cyan().bold(),
                color_percent(response.confidence)
            );
        }
    }

    Ok(())
}
