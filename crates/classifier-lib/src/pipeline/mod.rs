//! Model refresh pipeline
//!
//! This module provides:
//! - Label coercion, seedable shuffling and train/test splitting
//! - Classifier fitting and held-out evaluation
//! - The refresh orchestrator that publishes bundles to the model store

mod evaluator;
mod preprocess;
mod refresh;
mod trainer;


pub use evaluator::{Evaluation, Evaluator};
pub use preprocess::{Preprocessor, SplitConfig, DEFAULT_TEST_RATIO};
pub use refresh::{
    RefreshPipeline, RefreshPipelineBuilder, RefreshTrigger, DEFAULT_REFRESH_TIMEOUT,
};
pub use trainer::Trainer;
