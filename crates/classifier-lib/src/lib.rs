//! Iris classifier library
//!
//! This crate provides the core functionality for:
//! - Loading labeled datasets and splitting them into train/test partitions
//! - Fitting and evaluating a decision tree classifier
//! - Publishing trained models to a lock-protected model store
//! - Scheduled and manual background retraining
//! - Prediction, health checks and observability

pub mod classifier;
pub mod dataset;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{ClassifierError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use pipeline::{RefreshPipeline, RefreshTrigger};
pub use scheduler::{Cadence, RetrainScheduler};
pub use service::{Prediction, PredictionService};
pub use store::{ModelBundle, ModelStore, ModelSummary};
