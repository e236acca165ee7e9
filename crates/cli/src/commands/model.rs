//! Model inspection and retraining commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, ModelSummary};
use crate::output::{
    color_percent, format_timestamp, print_json, print_success, print_table, OutputFormat,
};

/// Row for the model table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Generation")]
    generation: u64,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Trained")]
    trained_at: String,
    #[tabled(rename = "Train")]
    train_samples: usize,
    #[tabled(rename = "Test")]
    test_samples: usize,
    #[tabled(rename = "Classes")]
    classes: String,
}

impl From<&ModelSummary> for ModelRow {
    fn from(m: &ModelSummary) -> Self {
        Self {
            generation: m.generation,
            accuracy: color_percent(m.accuracy),
            trained_at: format_timestamp(&m.trained_at),
            train_samples: m.train_samples,
            test_samples: m.test_samples,
            classes: m.classes.join(", "),
        }
    }
}

/// Show the model currently being served
pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let model = client.model().await?;

    match format {
        OutputFormat::Json => print_json(&model)?,
        OutputFormat::Table => print_table(vec![ModelRow::from(&model)]),
    }

    Ok(())
}

/// Trigger a manual retrain and wait for it to publish
pub async fn retrain(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response = client.retrain().await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Model retrained, now serving generation {}",
                response.model.generation
            ));
            print_table(vec![ModelRow::from(&response.model)]);
        }
    }

    Ok(())
}
