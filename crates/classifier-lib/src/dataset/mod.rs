//! Dataset providers
//!
//! A provider produces an immutable labeled [`Dataset`] on demand. The
//! baseline provider serves an embedded Iris sample; a CSV file provider can
//! be substituted without touching the rest of the refresh pipeline.

mod csv_file;
mod iris;

pub use csv_file::CsvDatasetProvider;
pub use iris::{IrisDatasetProvider, IRIS_CSV};

use crate::error::{ClassifierError, Result};
use crate::models::{Dataset, Features, Sample, Schema, NUM_FEATURES};
use csv::{ReaderBuilder, Trim};
use std::sync::Arc;

pub use async_trait::async_trait;

/// Source of labeled training data
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Load the full dataset
    async fn load(&self) -> Result<Dataset>;

    /// Short description used in logs
    fn describe(&self) -> String;
}

/// Parse `f1,f2,f3,f4,label` rows into a dataset
///
/// Fields may be quoted and are trimmed. Blank lines and lines starting with
/// `#` are skipped. A first row whose leading column is not numeric is
/// treated as a header.
pub fn parse_csv(content: &str, schema: Arc<Schema>) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            ClassifierError::DataSource(format!("line {}: {}", line, e))
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.iter().all(str::is_empty) {
            continue;
        }

        if record.len() != NUM_FEATURES + 1 {
            return Err(ClassifierError::DataSource(format!(
                "line {}: expected {} columns, found {}",
                line,
                NUM_FEATURES + 1,
                record.len()
            )));
        }

        if samples.is_empty() && record[0].parse::<f64>().is_err() {
            // header row
            continue;
        }

        let mut features: Features = [0.0; NUM_FEATURES];
        for (slot, value) in features.iter_mut().zip(record.iter()) {
            *slot = value.parse::<f64>().map_err(|_| {
                ClassifierError::DataSource(format!("line {}: '{}' is not a number", line, value))
            })?;
        }

        samples.push(Sample::new(features, &record[NUM_FEATURES]));
    }

    Ok(Dataset::new(schema, samples))
}
