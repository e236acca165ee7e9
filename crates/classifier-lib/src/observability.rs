//! Observability infrastructure for the classifier service
//!
//! Provides:
//! - Prometheus metrics (refresh duration, prediction latency, model accuracy)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for prediction latency (in seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Histogram buckets for refresh duration (in seconds)
const REFRESH_BUCKETS: &[f64] = &[0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    refresh_duration_seconds: Histogram,
    prediction_latency_seconds: Histogram,
    refreshes: IntCounterVec,
    predictions_served: IntCounter,
    prediction_errors: IntCounterVec,
    model_accuracy_percent: Gauge,
    model_generation: IntGauge,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            refresh_duration_seconds: register_histogram!(
                "iris_classifier_refresh_duration_seconds",
                "Time spent loading, training, evaluating and publishing a model",
                REFRESH_BUCKETS.to_vec()
            )
            .expect("Failed to register refresh_duration_seconds"),

            prediction_latency_seconds: register_histogram!(
                "iris_classifier_prediction_latency_seconds",
                "Time spent serving a single prediction",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            refreshes: register_int_counter_vec!(
                "iris_classifier_refreshes_total",
                "Refresh attempts by outcome",
                &["outcome"]
            )
            .expect("Failed to register refreshes_total"),

            predictions_served: register_int_counter!(
                "iris_classifier_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "iris_classifier_prediction_errors_total",
                "Rejected prediction requests by error code",
                &["code"]
            )
            .expect("Failed to register prediction_errors_total"),

            model_accuracy_percent: register_gauge!(
                "iris_classifier_model_accuracy_percent",
                "Test-partition accuracy of the model being served"
            )
            .expect("Failed to register model_accuracy_percent"),

            model_generation: register_int_gauge!(
                "iris_classifier_model_generation",
                "Generation number of the model being served"
            )
            .expect("Failed to register model_generation"),
        }
    }
}

/// Refresh outcome label values
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const FAILURE: &str = "failure";
    pub const SKIPPED: &str = "skipped";
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_refresh_duration(&self, duration_secs: f64) {
        self.inner().refresh_duration_seconds.observe(duration_secs);
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Count a refresh attempt, see [`outcome`]
    pub fn inc_refresh(&self, outcome: &str) {
        self.inner().refreshes.with_label_values(&[outcome]).inc();
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_served.inc();
    }

    pub fn inc_prediction_errors(&self, code: &str) {
        self.inner().prediction_errors.with_label_values(&[code]).inc();
    }

    /// Update gauges describing the served model
    pub fn set_model(&self, generation: u64, accuracy: f64) {
        self.inner().model_generation.set(generation as i64);
        self.inner().model_accuracy_percent.set(accuracy);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for refreshes, predictions
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, dataset: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            dataset = %dataset,
            "Iris classifier started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Iris classifier shutting down"
        );
    }

    /// Log a successful refresh
    #[allow(clippy::too_many_arguments)]
    pub fn log_refresh(
        &self,
        trigger: &str,
        generation: u64,
        accuracy: f64,
        correct: usize,
        total: usize,
        train_samples: usize,
        duration_ms: u64,
    ) {
        info!(
            event = "model_refreshed",
            instance = %self.instance,
            trigger = %trigger,
            generation = generation,
            accuracy = accuracy,
            correct = correct,
            total = total,
            train_samples = train_samples,
            duration_ms = duration_ms,
            "Model retrained and published"
        );
    }

    /// Log a failed refresh; the previous model keeps serving
    pub fn log_refresh_failed(&self, trigger: &str, code: &str, reason: &str, serving: Option<u64>) {
        error!(
            event = "model_refresh_failed",
            instance = %self.instance,
            trigger = %trigger,
            code = %code,
            reason = %reason,
            serving_generation = ?serving,
            "Model refresh failed, keeping previous model"
        );
    }

    /// Log a refresh skipped because another one is running
    pub fn log_refresh_skipped(&self, trigger: &str) {
        warn!(
            event = "model_refresh_skipped",
            instance = %self.instance,
            trigger = %trigger,
            "Refresh already in progress, skipping trigger"
        );
    }

    /// Log a served prediction
    pub fn log_prediction(&self, species: &str, confidence: f64, generation: u64) {
        tracing::debug!(
            event = "prediction_served",
            instance = %self.instance,
            species = %species,
            confidence = confidence,
            generation = generation,
            "Predicted class"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_metrics_creation() {
        let metrics = ServiceMetrics::new();

        metrics.observe_refresh_duration(0.2);
        metrics.observe_prediction_latency(0.0001);
        metrics.inc_refresh(outcome::SUCCESS);
        metrics.inc_refresh(outcome::SKIPPED);
        metrics.inc_predictions();
        metrics.inc_prediction_errors("invalid_input");
        metrics.set_model(3, 88.9);

        // a second handle shares the same registry entries
        let other = ServiceMetrics::new();
        other.inc_predictions();
    }

    #[test]
    fn test_metrics_are_exposed() {
        let metrics = ServiceMetrics::new();
        metrics.set_model(1, 100.0);

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "iris_classifier_model_generation"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
