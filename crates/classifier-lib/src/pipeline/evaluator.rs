//! Scores a fitted classifier on the held-out partition

use crate::classifier::FittedClassifier;
use crate::error::{ClassifierError, Result};
use crate::models::Partition;

/// Outcome of scoring a model on a test partition
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
    /// `confusion[actual][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

impl Evaluation {
    /// Percent of samples classified correctly, in `[0, 100]`
    pub fn accuracy(&self) -> f64 {
        self.correct as f64 / self.total as f64 * 100.0
    }

    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Score `model` on `test`
    ///
    /// An empty partition has no defined accuracy and fails with
    /// [`ClassifierError::Evaluation`].
    pub fn evaluate(&self, model: &dyn FittedClassifier, test: &Partition) -> Result<Evaluation> {
        if test.is_empty() {
            return Err(ClassifierError::Evaluation(
                "test partition is empty, accuracy is undefined".to_string(),
            ));
        }

        let num_classes = test.schema().num_classes();
        let mut confusion = vec![vec![0usize; num_classes]; num_classes];
        let mut correct = 0;

        for sample in test.samples() {
            let prediction = model.predict(&sample.features);
            if prediction.class >= num_classes {
                return Err(ClassifierError::Evaluation(format!(
                    "model predicted class {} outside the {} known classes",
                    prediction.class, num_classes
                )));
            }
            if prediction.class == sample.class {
                correct += 1;
            }
            confusion[sample.class][prediction.class] += 1;
        }

        Ok(Evaluation {
            correct,
            total: test.len(),
            confusion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabeledSample, PartitionRole, Schema};
    use crate::testing::TaggedModel;
    use std::sync::Arc;

    fn test_partition(classes: &[usize]) -> Partition {
        let samples = classes
            .iter()
            .map(|&class| LabeledSample {
                features: [0.0; 4],
                class,
            })
            .collect();
        Partition::new(PartitionRole::Test, Arc::new(Schema::iris()), samples)
    }

    #[test]
    fn test_accuracy_counts_matches() {
        // always predicts class 0
        let model = TaggedModel::new(0);
        let evaluation = Evaluator::new()
            .evaluate(&model, &test_partition(&[0, 0, 1, 2]))
            .unwrap();

        assert_eq!(evaluation.correct, 2);
        assert_eq!(evaluation.incorrect(), 2);
        assert_eq!(evaluation.accuracy(), 50.0);
        assert_eq!(evaluation.confusion[1][0], 1);
        assert_eq!(evaluation.confusion[2][0], 1);
        assert_eq!(evaluation.confusion[0][0], 2);
    }

    #[test]
    fn test_perfect_and_zero_accuracy() {
        let model = TaggedModel::new(1);
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.evaluate(&model, &test_partition(&[1, 1])).unwrap().accuracy(),
            100.0
        );
        assert_eq!(
            evaluator.evaluate(&model, &test_partition(&[0, 2])).unwrap().accuracy(),
            0.0
        );
    }

    #[test]
    fn test_empty_partition_fails() {
        let err = Evaluator::new()
            .evaluate(&TaggedModel::new(0), &test_partition(&[]))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Evaluation(_)));
    }

    #[test]
    fn test_out_of_domain_prediction_fails() {
        let model = TaggedModel::with_distribution(4, vec![0.2; 5]);
        let err = Evaluator::new()
            .evaluate(&model, &test_partition(&[0]))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Evaluation(_)));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let model = TaggedModel::new(2);
        let partition = test_partition(&[0, 1, 2, 2, 1]);
        let evaluator = Evaluator::new();
        assert_eq!(
            evaluator.evaluate(&model, &partition).unwrap(),
            evaluator.evaluate(&model, &partition).unwrap()
        );
    }
}
