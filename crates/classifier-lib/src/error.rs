//! Error taxonomy for the classifier service
//!
//! Refresh-pipeline errors (`DataSource` through `Evaluation`, plus
//! `RefreshTimeout`) are caught at the scheduler boundary and never reach
//! prediction callers. `ModelNotReady` and `InvalidInput` are returned to
//! prediction callers as rejected requests.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = ClassifierError> = std::result::Result<T, E>;

/// Errors raised by the refresh pipeline and the prediction service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// Dataset unavailable or malformed
    #[error("data source error: {0}")]
    DataSource(String),

    /// Label or feature values inconsistent with the schema
    #[error("schema error: {0}")]
    Schema(String),

    /// Too few samples to split or train
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Fitting the classifier failed
    #[error("training error: {0}")]
    Training(String),

    /// Scoring the fitted classifier failed
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// No model has been published yet
    #[error("model not ready: no model has been trained yet")]
    ModelNotReady,

    /// Malformed prediction request
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid service configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A refresh exceeded its time budget and was abandoned
    #[error("refresh timed out after {0}s")]
    RefreshTimeout(u64),
}

impl ClassifierError {
    /// Stable machine-readable code for API bodies and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            ClassifierError::DataSource(_) => "data_source_error",
            ClassifierError::Schema(_) => "schema_error",
            ClassifierError::InsufficientData(_) => "insufficient_data",
            ClassifierError::Training(_) => "training_error",
            ClassifierError::Evaluation(_) => "evaluation_error",
            ClassifierError::ModelNotReady => "model_not_ready",
            ClassifierError::InvalidInput(_) => "invalid_input",
            ClassifierError::Configuration(_) => "configuration_error",
            ClassifierError::RefreshTimeout(_) => "refresh_timeout",
        }
    }

    /// Returns true for errors caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassifierError::InvalidInput(_))
    }
}
