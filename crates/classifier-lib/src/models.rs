//! Core data models for the classifier service

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of numeric features per sample
pub const NUM_FEATURES: usize = 4;

/// Feature values in schema attribute order
pub type Features = [f64; NUM_FEATURES];

/// Attribute names and label domain shared by a dataset and the models
/// trained on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub relation: String,
    pub attributes: Vec<String>,
    pub classes: Vec<String>,
}

impl Schema {
    /// Schema of the Iris relation
    pub fn iris() -> Self {
        Self {
            relation: "iris".to_string(),
            attributes: vec![
                "sepallength".to_string(),
                "sepalwidth".to_string(),
                "petallength".to_string(),
                "petalwidth".to_string(),
            ],
            classes: vec![
                "Iris-setosa".to_string(),
                "Iris-versicolor".to_string(),
                "Iris-virginica".to_string(),
            ],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Position of a label in the class domain
    pub fn class_index(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}

/// One labeled observation as produced by a dataset provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub features: Features,
    pub label: String,
}

impl Sample {
    pub fn new(features: Features, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// Ordered samples sharing one schema
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>, samples: Vec<Sample>) -> Self {
        Self { schema, samples }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A sample whose label has been coerced into a class index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
    pub features: Features,
    pub class: usize,
}

/// Which side of the split a partition came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionRole {
    Train,
    Test,
}

/// A disjoint subset of a preprocessed dataset
#[derive(Debug, Clone)]
pub struct Partition {
    role: PartitionRole,
    schema: Arc<Schema>,
    samples: Vec<LabeledSample>,
}

impl Partition {
    pub fn new(role: PartitionRole, schema: Arc<Schema>, samples: Vec<LabeledSample>) -> Self {
        Self {
            role,
            schema,
            samples,
        }
    }

    pub fn role(&self) -> PartitionRole {
        self.role
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of distinct classes present
    pub fn distinct_classes(&self) -> usize {
        let mut seen = vec![false; self.schema.num_classes()];
        for sample in &self.samples {
            if let Some(slot) = seen.get_mut(sample.class) {
                *slot = true;
            }
        }
        seen.into_iter().filter(|s| *s).count()
    }
}

/// Prediction request body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrisRequest {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl IrisRequest {
    /// Feature values in schema attribute order
    pub fn to_features(&self) -> Features {
        [
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

/// Prediction response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrisResponse {
    pub species: String,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iris_schema_class_lookup() {
        let schema = Schema::iris();
        assert_eq!(schema.num_classes(), 3);
        assert_eq!(schema.class_index("Iris-versicolor"), Some(1));
        assert_eq!(schema.class_index("Iris-unknown"), None);
        assert_eq!(schema.class_name(2), Some("Iris-virginica"));
        assert_eq!(schema.class_name(3), None);
    }

    #[test]
    fn test_request_uses_camel_case() {
        let json = r#"{"sepalLength":5.1,"sepalWidth":3.5,"petalLength":1.4,"petalWidth":0.2}"#;
        let request: IrisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.to_features(), [5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn test_request_rejects_missing_field() {
        let json = r#"{"sepalLength":5.1,"sepalWidth":3.5,"petalLength":1.4}"#;
        assert!(serde_json::from_str::<IrisRequest>(json).is_err());
    }

    #[test]
    fn test_partition_distinct_classes() {
        let schema = Arc::new(Schema::iris());
        let samples = vec![
            LabeledSample { features: [0.0; NUM_FEATURES], class: 0 },
            LabeledSample { features: [1.0; NUM_FEATURES], class: 0 },
            LabeledSample { features: [2.0; NUM_FEATURES], class: 2 },
        ];
        let partition = Partition::new(PartitionRole::Train, schema, samples);
        assert_eq!(partition.distinct_classes(), 2);
        assert_eq!(partition.role(), PartitionRole::Train);
    }
}
