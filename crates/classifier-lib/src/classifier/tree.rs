//! Decision tree classifier backed by the `gbdt` crate
//!
//! `gbdt` grows regression trees, so the classifier grows a single tree with
//! squared-error loss against the class index. The tree only decides the
//! partition of feature space. Class probabilities come from counting which
//! training samples land in each leaf: every leaf holds at least one training
//! sample, so every prediction is backed by observed class frequencies.
//!
//! Leaves are told apart by their fitted value. Two leaves that happen to
//! share a value share one frequency entry, which still only merges real
//! counts. An input whose leaf value was never seen during fitting falls
//! back to the class prior of the training partition.
//!
//! Note: gbdt works in `f32` (`ValueType`) while features are `f64`.
//! Conversions happen at the crate boundary.

use super::{ClassPrediction, Classifier, FittedClassifier};
use crate::error::{ClassifierError, Result};
use crate::models::{Features, Partition, NUM_FEATURES};
use gbdt::config::Loss;
use gbdt::decision_tree::{Data, DataVec, DecisionTree, TrainingCache};
use std::collections::HashMap;
use std::fmt;

/// Tree growth parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    pub max_depth: u32,
    pub min_leaf_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_leaf_size: 1,
        }
    }
}

#[inline]
fn features_to_f32(features: &Features) -> Vec<f32> {
    features.iter().map(|&v| v as f32).collect()
}

/// Leaf value as a hashable key
#[inline]
fn leaf_key(value: f32) -> u32 {
    value.to_bits()
}

/// Normalize class counts into a distribution
fn normalize(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    counts
        .iter()
        .map(|&c| c as f64 / total as f64)
        .collect()
}

/// Decision tree learner
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeClassifier {
    config: TreeConfig,
}

impl DecisionTreeClassifier {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    fn grow_tree(&self, data: &DataVec) -> DecisionTree {
        let mut tree = DecisionTree::new();
        tree.set_feature_size(NUM_FEATURES);
        tree.set_max_depth(self.config.max_depth);
        tree.set_min_leaf_size(self.config.min_leaf_size);
        tree.set_loss(Loss::SquaredError);

        let mut cache = TrainingCache::get_cache(NUM_FEATURES, data, 2);
        tree.fit(data, &mut cache);
        tree
    }

    /// Grow the shared tree and tally class frequencies per leaf
    pub fn fit_model(&self, train: &Partition) -> Result<DecisionTreeModel> {
        if train.is_empty() {
            return Err(ClassifierError::Training(
                "training partition is empty".to_string(),
            ));
        }

        let distinct = train.distinct_classes();
        if distinct < 2 {
            return Err(ClassifierError::Training(format!(
                "training partition contains {} distinct class, need at least 2",
                distinct
            )));
        }

        if self.config.max_depth == 0 {
            return Err(ClassifierError::Configuration(
                "max_depth must be at least 1".to_string(),
            ));
        }

        let num_classes = train.schema().num_classes();
        if let Some(sample) = train.samples().iter().find(|s| s.class >= num_classes) {
            return Err(ClassifierError::Training(format!(
                "class index {} out of range for {} classes",
                sample.class, num_classes
            )));
        }

        let data: DataVec = train
            .samples()
            .iter()
            .map(|s| {
                Data::new_training_data(features_to_f32(&s.features), 1.0_f32, s.class as f32, None)
            })
            .collect();

        let tree = self.grow_tree(&data);

        // Route every training sample back through the tree to count classes per leaf
        let leaf_values = tree.predict(&data);
        let mut leaves: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut prior_counts = vec![0usize; num_classes];
        for (sample, value) in train.samples().iter().zip(leaf_values) {
            leaves
                .entry(leaf_key(value))
                .or_insert_with(|| vec![0; num_classes])[sample.class] += 1;
            prior_counts[sample.class] += 1;
        }

        let leaves = leaves
            .into_iter()
            .map(|(key, counts)| (key, normalize(&counts)))
            .collect();

        Ok(DecisionTreeModel {
            tree,
            leaves,
            prior: normalize(&prior_counts),
            config: self.config,
        })
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&self, train: &Partition) -> Result<Box<dyn FittedClassifier>> {
        Ok(Box::new(self.fit_model(train)?))
    }

    fn name(&self) -> &str {
        "decision-tree"
    }
}

/// Fitted tree plus the class frequencies observed in each leaf
pub struct DecisionTreeModel {
    tree: DecisionTree,
    leaves: HashMap<u32, Vec<f64>>,
    prior: Vec<f64>,
    config: TreeConfig,
}

impl DecisionTreeModel {
    /// Number of distinct leaf values seen during fitting
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Class frequencies of the training partition
    pub fn prior(&self) -> &[f64] {
        &self.prior
    }
}

impl fmt::Debug for DecisionTreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionTreeModel")
            .field("classes", &self.prior.len())
            .field("leaves", &self.leaves.len())
            .field("config", &self.config)
            .finish()
    }
}

impl FittedClassifier for DecisionTreeModel {
    fn predict(&self, features: &Features) -> ClassPrediction {
        let data: DataVec = vec![Data::new_test_data(features_to_f32(features), None)];

        let distribution = self
            .tree
            .predict(&data)
            .first()
            .and_then(|value| self.leaves.get(&leaf_key(*value)))
            .unwrap_or(&self.prior)
            .clone();

        ClassPrediction::from_distribution(distribution)
    }

    fn num_classes(&self) -> usize {
        self.prior.len()
    }
}
