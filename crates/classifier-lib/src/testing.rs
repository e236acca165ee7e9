//! Test doubles shared by unit tests

use crate::classifier::{ClassPrediction, Classifier, FittedClassifier};
use crate::dataset::{async_trait, DatasetProvider, IrisDatasetProvider};
use crate::error::{ClassifierError, Result};
use crate::models::{Dataset, Features, Partition};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fitted model whose every answer is derived from a tag
#[derive(Debug, Clone)]
pub(crate) struct TaggedModel {
    class: usize,
    distribution: Vec<f64>,
}

impl TaggedModel {
    /// One-hot prediction at `tag % 3`
    pub(crate) fn new(tag: usize) -> Self {
        let class = tag % 3;
        let mut distribution = vec![0.0; 3];
        distribution[class] = 1.0;
        Self {
            class,
            distribution,
        }
    }

    pub(crate) fn with_distribution(class: usize, distribution: Vec<f64>) -> Self {
        Self {
            class,
            distribution,
        }
    }
}

impl FittedClassifier for TaggedModel {
    fn predict(&self, _features: &Features) -> ClassPrediction {
        ClassPrediction {
            class: self.class,
            distribution: self.distribution.clone(),
        }
    }

    fn num_classes(&self) -> usize {
        self.distribution.len()
    }
}

/// Classifier that counts fits and optionally takes its time
#[derive(Debug, Default)]
pub(crate) struct StubClassifier {
    fits: AtomicUsize,
    delay: Duration,
}

impl StubClassifier {
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            fits: AtomicUsize::new(0),
            delay,
        }
    }

    pub(crate) fn fit_count(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn fit(&self, train: &Partition) -> Result<Box<dyn FittedClassifier>> {
        if train.is_empty() {
            return Err(ClassifierError::Training("empty".to_string()));
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let n = self.fits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(TaggedModel::new(n)))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Serves the embedded iris sample until `fail_from` loads have happened
#[derive(Debug, Default)]
pub(crate) struct ScriptedProvider {
    loads: AtomicUsize,
    fail_from: Option<usize>,
}

impl ScriptedProvider {
    pub(crate) fn failing_after(successful_loads: usize) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            fail_from: Some(successful_loads),
        }
    }
}

#[async_trait]
impl DatasetProvider for ScriptedProvider {
    async fn load(&self) -> Result<Dataset> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        match self.fail_from {
            Some(limit) if n >= limit => Err(ClassifierError::DataSource(
                "upstream unavailable".to_string(),
            )),
            _ => IrisDatasetProvider::new().load().await,
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
