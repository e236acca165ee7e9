//! Label coercion, shuffling and train/test splitting

use crate::error::{ClassifierError, Result};
use crate::models::{Dataset, LabeledSample, Partition, PartitionRole};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Default fraction of samples held out for evaluation
pub const DEFAULT_TEST_RATIO: f64 = 0.3;

/// Configuration for the preprocessor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Fraction of shuffled samples placed in the test partition
    pub test_ratio: f64,
    /// Fixed shuffle seed; a fresh seed is drawn per call when unset
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: DEFAULT_TEST_RATIO,
            seed: None,
        }
    }
}

/// Turns a raw dataset into disjoint train and test partitions
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: SplitConfig,
}

impl Preprocessor {
    pub fn new(config: SplitConfig) -> Result<Self> {
        if !(config.test_ratio > 0.0 && config.test_ratio < 1.0) {
            return Err(ClassifierError::Configuration(format!(
                "test ratio must be in (0, 1), got {}",
                config.test_ratio
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> SplitConfig {
        self.config
    }

    /// Coerce labels, shuffle and split into `(train, test)`
    pub fn prepare(&self, dataset: &Dataset) -> Result<(Partition, Partition)> {
        if dataset.len() < 2 {
            return Err(ClassifierError::InsufficientData(format!(
                "need at least 2 samples to split, got {}",
                dataset.len()
            )));
        }

        let mut samples = coerce_labels(dataset)?;

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(rand::random()),
        };
        samples.shuffle(&mut rng);

        let test_len = test_size(samples.len(), self.config.test_ratio);
        let train_samples = samples.split_off(test_len);
        let test_samples = samples;

        debug!(
            train = train_samples.len(),
            test = test_samples.len(),
            "Dataset split"
        );

        let schema = dataset.schema().clone();
        Ok((
            Partition::new(PartitionRole::Train, schema.clone(), train_samples),
            Partition::new(PartitionRole::Test, schema, test_samples),
        ))
    }
}

/// Map every label into the schema's class domain
fn coerce_labels(dataset: &Dataset) -> Result<Vec<LabeledSample>> {
    let schema = dataset.schema();
    if schema.classes.is_empty() {
        return Err(ClassifierError::Schema(
            "schema defines no classes".to_string(),
        ));
    }

    dataset
        .samples()
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            if sample.features.iter().any(|v| !v.is_finite()) {
                return Err(ClassifierError::Schema(format!(
                    "sample {} has a non-finite feature value",
                    index
                )));
            }
            let class = schema.class_index(sample.label.trim()).ok_or_else(|| {
                ClassifierError::Schema(format!(
                    "sample {} has label '{}' outside the class domain {:?}",
                    index, sample.label, schema.classes
                ))
            })?;
            Ok(LabeledSample {
                features: sample.features,
                class,
            })
        })
        .collect()
}

/// Test partition size: `floor(n * ratio)` clamped so neither side is empty
fn test_size(n: usize, ratio: f64) -> usize {
    let raw = (n as f64 * ratio).floor() as usize;
    raw.clamp(1, n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sample, Schema};
    use std::sync::Arc;

    fn dataset(n: usize) -> Dataset {
        let schema = Schema::iris();
        let samples = (0..n)
            .map(|i| {
                let label = schema.classes[i % 3].clone();
                Sample::new([i as f64, 0.0, 0.0, 0.0], label)
            })
            .collect();
        Dataset::new(Arc::new(schema), samples)
    }

    fn seeded(ratio: f64, seed: u64) -> Preprocessor {
        Preprocessor::new(SplitConfig {
            test_ratio: ratio,
            seed: Some(seed),
        })
        .unwrap()
    }

    fn ids(partition: &Partition) -> Vec<usize> {
        partition
            .samples()
            .iter()
            .map(|s| s.features[0] as usize)
            .collect()
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        for n in [2usize, 3, 7, 10, 30, 101] {
            for ratio in [0.01, 0.3, 0.5, 0.99] {
                let (train, test) = seeded(ratio, 42).prepare(&dataset(n)).unwrap();
                assert_eq!(train.len() + test.len(), n);
                assert!(!train.is_empty() && !test.is_empty());

                let mut all: Vec<usize> = ids(&train).into_iter().chain(ids(&test)).collect();
                all.sort_unstable();
                assert_eq!(all, (0..n).collect::<Vec<_>>(), "n={} ratio={}", n, ratio);
            }
        }
    }

    #[test]
    fn test_test_partition_takes_the_ratio() {
        let (train, test) = seeded(0.3, 1).prepare(&dataset(30)).unwrap();
        assert_eq!(test.len(), 9);
        assert_eq!(train.len(), 21);
        assert_eq!(train.role(), PartitionRole::Train);
        assert_eq!(test.role(), PartitionRole::Test);
    }

    #[test]
    fn test_same_seed_same_split() {
        let data = dataset(30);
        let (train_a, test_a) = seeded(0.3, 7).prepare(&data).unwrap();
        let (train_b, test_b) = seeded(0.3, 7).prepare(&data).unwrap();
        assert_eq!(ids(&train_a), ids(&train_b));
        assert_eq!(ids(&test_a), ids(&test_b));
    }

    #[test]
    fn test_different_seeds_shuffle_differently() {
        let data = dataset(30);
        let (_, test_a) = seeded(0.5, 1).prepare(&data).unwrap();
        let (_, test_b) = seeded(0.5, 2).prepare(&data).unwrap();
        assert_ne!(ids(&test_a), ids(&test_b));
    }

    #[test]
    fn test_unknown_label_is_schema_error() {
        let schema = Arc::new(Schema::iris());
        let samples = vec![
            Sample::new([5.1, 3.5, 1.4, 0.2], "Iris-setosa"),
            Sample::new([5.1, 3.5, 1.4, 0.2], "Iris-germanica"),
        ];
        let err = seeded(0.5, 1)
            .prepare(&Dataset::new(schema, samples))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Schema(_)));
    }

    #[test]
    fn test_non_finite_feature_is_schema_error() {
        let schema = Arc::new(Schema::iris());
        let samples = vec![
            Sample::new([5.1, 3.5, 1.4, 0.2], "Iris-setosa"),
            Sample::new([f64::NAN, 3.5, 1.4, 0.2], "Iris-setosa"),
        ];
        let err = seeded(0.5, 1)
            .prepare(&Dataset::new(schema, samples))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Schema(_)));
    }

    #[test]
    fn test_too_few_samples() {
        let err = seeded(0.3, 1).prepare(&dataset(1)).unwrap_err();
        assert!(matches!(err, ClassifierError::InsufficientData(_)));

        let err = seeded(0.3, 1).prepare(&dataset(0)).unwrap_err();
        assert!(matches!(err, ClassifierError::InsufficientData(_)));
    }

    #[test]
    fn test_ratio_must_be_open_interval() {
        for ratio in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = Preprocessor::new(SplitConfig {
                test_ratio: ratio,
                seed: None,
            });
            assert!(
                matches!(result, Err(ClassifierError::Configuration(_))),
                "ratio {} should be rejected",
                ratio
            );
        }
    }

    #[test]
    fn test_unseeded_split_still_complete() {
        let preprocessor = Preprocessor::new(SplitConfig::default()).unwrap();
        let (train, test) = preprocessor.prepare(&dataset(10)).unwrap();
        assert_eq!(train.len() + test.len(), 10);
    }
}
