//! CSV file-backed dataset provider

use super::{async_trait, parse_csv, DatasetProvider};
use crate::error::{ClassifierError, Result};
use crate::models::{Dataset, Schema};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads `f1,f2,f3,f4,label` rows from a file on every load
#[derive(Debug, Clone)]
pub struct CsvDatasetProvider {
    path: PathBuf,
    schema: Arc<Schema>,
}

impl CsvDatasetProvider {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema: Arc::new(schema),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetProvider for CsvDatasetProvider {
    async fn load(&self) -> Result<Dataset> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ClassifierError::DataSource(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let dataset = parse_csv(&content, self.schema.clone())?;
        tracing::debug!(
            path = %self.path.display(),
            instances = dataset.len(),
            "Loaded dataset from file"
        );
        Ok(dataset)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}
