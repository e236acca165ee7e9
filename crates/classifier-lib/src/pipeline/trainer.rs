//! Fits the configured classifier on a training partition

use crate::classifier::{Classifier, FittedClassifier};
use crate::error::{ClassifierError, Result};
use crate::models::{Partition, PartitionRole};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Clone)]
pub struct Trainer {
    classifier: Arc<dyn Classifier>,
}

impl Trainer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn algorithm(&self) -> &str {
        self.classifier.name()
    }

    /// Fit a new model on `train`
    ///
    /// Fails with [`ClassifierError::Training`] on an empty partition or one
    /// holding a single class, whatever the underlying algorithm accepts.
    pub fn fit(&self, train: &Partition) -> Result<Box<dyn FittedClassifier>> {
        if train.role() != PartitionRole::Train {
            return Err(ClassifierError::Training(
                "refusing to fit on a test partition".to_string(),
            ));
        }
        if train.is_empty() {
            return Err(ClassifierError::Training(
                "training partition is empty".to_string(),
            ));
        }
        if train.distinct_classes() < 2 {
            return Err(ClassifierError::Training(
                "training partition holds a single class".to_string(),
            ));
        }

        let start = Instant::now();
        let fitted = self.classifier.fit(train)?;
        debug!(
            algorithm = self.classifier.name(),
            samples = train.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classifier fitted"
        );
        Ok(fitted)
    }
}
