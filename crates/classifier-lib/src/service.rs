//! Prediction service
//!
//! Validates a feature vector, takes a snapshot of the current bundle and
//! maps the classifier output to a species name and confidence. Purely a
//! read: safe to call from any number of request handlers while a refresh
//! is in flight.

use crate::error::{ClassifierError, Result};
use crate::models::{Features, IrisRequest, IrisResponse, NUM_FEATURES};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::store::ModelStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Result of classifying one feature vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub species: String,
    /// Probability of the predicted species, in percent
    pub confidence: f64,
    /// Generation of the bundle that answered
    pub generation: u64,
}

impl From<Prediction> for IrisResponse {
    fn from(prediction: Prediction) -> Self {
        IrisResponse {
            species: prediction.species,
            confidence: prediction.confidence,
        }
    }
}

#[derive(Clone)]
pub struct PredictionService {
    store: Arc<ModelStore>,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new("iris-classifier"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Classify a request body
    pub fn classify(&self, request: &IrisRequest) -> Result<Prediction> {
        self.predict(&request.to_features())
    }

    /// Classify a raw feature vector in schema attribute order
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        let start = Instant::now();
        let result = self.predict_inner(features);

        match &result {
            Ok(prediction) => {
                self.metrics.inc_predictions();
                self.metrics
                    .observe_prediction_latency(start.elapsed().as_secs_f64());
                self.logger.log_prediction(
                    &prediction.species,
                    prediction.confidence,
                    prediction.generation,
                );
            }
            Err(e) => self.metrics.inc_prediction_errors(e.code()),
        }

        result
    }

    fn predict_inner(&self, features: &[f64]) -> Result<Prediction> {
        let features: Features = features.try_into().map_err(|_| {
            ClassifierError::InvalidInput(format!(
                "expected {} features, got {}",
                NUM_FEATURES,
                features.len()
            ))
        })?;

        if let Some(position) = features.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidInput(format!(
                "feature {} is not a finite number",
                position
            )));
        }

        // One snapshot for the whole prediction: classifier and schema
        // always come from the same bundle.
        let bundle = self.store.current()?;
        let prediction = bundle.classifier().predict(&features);

        let species = bundle
            .schema()
            .class_name(prediction.class)
            .ok_or_else(|| {
                ClassifierError::Schema(format!(
                    "predicted class {} has no label in the schema",
                    prediction.class
                ))
            })?
            .to_string();

        Ok(Prediction {
            species,
            confidence: prediction.probability() * 100.0,
            generation: bundle.generation(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Schema;
    use crate::store::ModelBundle;
    use crate::testing::TaggedModel;
    use chrono::Utc;

    fn service_with(model: TaggedModel) -> PredictionService {
        let store = Arc::new(ModelStore::new());
        let bundle =
            ModelBundle::new(Box::new(model), Arc::new(Schema::iris()), 95.0, Utc::now(), 1)
                .unwrap();
        store.publish(bundle);
        PredictionService::new(store)
    }

    #[test]
    fn test_classify_setosa() {
        let service = service_with(TaggedModel::with_distribution(0, vec![0.9, 0.05, 0.05]));

        let prediction = service.predict(&[5.1, 3.5, 1.4, 0.2]).unwrap();

        assert_eq!(prediction.species, "Iris-setosa");
        assert_eq!(prediction.confidence, 90.0);
        assert_eq!(prediction.generation, 1);
    }

    #[test]
    fn test_classify_request_body() {
        let service = service_with(TaggedModel::with_distribution(2, vec![0.1, 0.2, 0.7]));
        let request = IrisRequest {
            sepal_length: 6.3,
            sepal_width: 3.3,
            petal_length: 6.0,
            petal_width: 2.5,
        };

        let response: IrisResponse = service.classify(&request).unwrap().into();
        assert_eq!(response.species, "Iris-virginica");
        assert!((response.confidence - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_before_first_refresh() {
        let service = PredictionService::new(Arc::new(ModelStore::new()));
        let err = service.predict(&[5.1, 3.5, 1.4, 0.2]).unwrap_err();
        assert_eq!(err, ClassifierError::ModelNotReady);
    }

    #[test]
    fn test_wrong_arity_is_invalid_input() {
        let service = service_with(TaggedModel::new(0));

        let err = service.predict(&[5.1, 3.5, 1.4]).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));

        let err = service.predict(&[5.1, 3.5, 1.4, 0.2, 9.9]).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }

    #[test]
    fn test_arity_checked_before_readiness() {
        let service = PredictionService::new(Arc::new(ModelStore::new()));
        let err = service.predict(&[1.0]).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_feature_is_invalid_input() {
        let service = service_with(TaggedModel::new(0));
        let err = service.predict(&[5.1, f64::INFINITY, 1.4, 0.2]).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_class_index_is_schema_error() {
        // four-way distribution cannot be published against the iris schema,
        // so swap in a model that reports three classes but answers index 3
        #[derive(Debug)]
        struct OffByOne;
        impl crate::classifier::FittedClassifier for OffByOne {
            fn predict(&self, _: &Features) -> crate::classifier::ClassPrediction {
                crate::classifier::ClassPrediction {
                    class: 3,
                    distribution: vec![0.0, 0.0, 0.0],
                }
            }
            fn num_classes(&self) -> usize {
                3
            }
        }

        let store = Arc::new(ModelStore::new());
        store.publish(
            ModelBundle::new(Box::new(OffByOne), Arc::new(Schema::iris()), 0.0, Utc::now(), 1)
                .unwrap(),
        );
        let err = PredictionService::new(store)
            .predict(&[5.1, 3.5, 1.4, 0.2])
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Schema(_)));
    }
}
