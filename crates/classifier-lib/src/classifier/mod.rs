//! Trainable classifier capability
//!
//! The learning algorithm is an opaque capability: [`Classifier::fit`]
//! produces an immutable [`FittedClassifier`] that can be queried
//! concurrently from any number of threads.

mod tree;

pub use tree::{DecisionTreeClassifier, DecisionTreeModel, TreeConfig};

use crate::error::Result;
use crate::models::{Features, Partition};
use std::fmt;

/// Something that can be fitted on a training partition
pub trait Classifier: Send + Sync {
    /// Fit a new model. Must not modify the partition.
    fn fit(&self, train: &Partition) -> Result<Box<dyn FittedClassifier>>;

    /// Algorithm name used in logs
    fn name(&self) -> &str;
}

/// A trained model
pub trait FittedClassifier: Send + Sync + fmt::Debug {
    /// Predict the class index and per-class probability distribution
    fn predict(&self, features: &Features) -> ClassPrediction;

    /// Size of the label domain the model was fitted against
    fn num_classes(&self) -> usize;
}

/// Output of a single prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPrediction {
    pub class: usize,
    pub distribution: Vec<f64>,
}

impl ClassPrediction {
    /// Build a prediction from a distribution, picking the most probable
    /// class (lowest index on ties)
    pub fn from_distribution(distribution: Vec<f64>) -> Self {
        let mut class = 0;
        for (index, p) in distribution.iter().enumerate() {
            if *p > distribution[class] {
                class = index;
            }
        }
        Self {
            class,
            distribution,
        }
    }

    /// Probability mass assigned to the predicted class
    pub fn probability(&self) -> f64 {
        self.distribution.get(self.class).copied().unwrap_or(0.0)
    }
}
