//! Model store holding the currently served model bundle
//!
//! The store owns at most one [`ModelBundle`] behind an `Arc`. Readers take
//! the read lock just long enough to clone the `Arc`; the refresh pipeline
//! builds a complete bundle off to the side and takes the write lock only to
//! swap the pointer. A reader therefore sees the previous bundle or the new
//! one in full, and keeps using its snapshot even after a swap.

use crate::classifier::FittedClassifier;
use crate::error::{ClassifierError, Result};
use crate::models::Schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable unit published to and read from the store
#[derive(Debug)]
pub struct ModelBundle {
    classifier: Box<dyn FittedClassifier>,
    schema: Arc<Schema>,
    accuracy: f64,
    trained_at: DateTime<Utc>,
    generation: u64,
    train_samples: usize,
    test_samples: usize,
}

impl ModelBundle {
    /// Assemble a bundle, rejecting inconsistent parts
    pub fn new(
        classifier: Box<dyn FittedClassifier>,
        schema: Arc<Schema>,
        accuracy: f64,
        trained_at: DateTime<Utc>,
        generation: u64,
    ) -> Result<Self> {
        if classifier.num_classes() != schema.num_classes() {
            return Err(ClassifierError::Schema(format!(
                "classifier predicts {} classes but schema defines {}",
                classifier.num_classes(),
                schema.num_classes()
            )));
        }

        if !(0.0..=100.0).contains(&accuracy) {
            return Err(ClassifierError::Evaluation(format!(
                "accuracy {} outside [0, 100]",
                accuracy
            )));
        }

        Ok(Self {
            classifier,
            schema,
            accuracy,
            trained_at,
            generation,
            train_samples: 0,
            test_samples: 0,
        })
    }

    /// Record the partition sizes the bundle was built from
    pub fn with_partition_sizes(mut self, train_samples: usize, test_samples: usize) -> Self {
        self.train_samples = train_samples;
        self.test_samples = test_samples;
        self
    }

    pub fn classifier(&self) -> &dyn FittedClassifier {
        self.classifier.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Test-partition accuracy in percent
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Publish counter, starting at 1 for the first successful refresh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            generation: self.generation,
            accuracy: self.accuracy,
            trained_at: self.trained_at,
            train_samples: self.train_samples,
            test_samples: self.test_samples,
            classes: self.schema.classes.clone(),
        }
    }
}

/// Serializable view of a bundle for admin endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub generation: u64,
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub train_samples: usize,
    pub test_samples: usize,
    pub classes: Vec<String>,
}

/// Single owner of the current model bundle
#[derive(Debug, Default)]
pub struct ModelStore {
    current: RwLock<Option<Arc<ModelBundle>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current bundle
    pub fn current(&self) -> Result<Arc<ModelBundle>> {
        // The critical sections only clone or replace an Arc, so a poisoned
        // lock still guards a consistent value.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().cloned().ok_or(ClassifierError::ModelNotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the current bundle, returning the one it superseded
    pub(crate) fn publish(&self, bundle: ModelBundle) -> (Arc<ModelBundle>, Option<Arc<ModelBundle>>) {
        let bundle = Arc::new(bundle);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            guard.replace(Arc::clone(&bundle))
        };
        (bundle, previous)
    }
}
