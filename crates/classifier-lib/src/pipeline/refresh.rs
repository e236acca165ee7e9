//! Refresh pipeline: load → preprocess → train → evaluate → publish
//!
//! One refresh runs at a time behind an async gate. Startup and manual
//! refreshes wait their turn; scheduled ticks are dropped while another
//! refresh is running. The new bundle is built off the async runtime and
//! published with a single pointer swap, so predictions keep reading the
//! previous bundle for the whole training run.

use super::{Evaluation, Evaluator, Preprocessor, SplitConfig, Trainer};
use crate::classifier::{Classifier, DecisionTreeClassifier, FittedClassifier};
use crate::dataset::{DatasetProvider, IrisDatasetProvider};
use crate::error::{ClassifierError, Result};
use crate::health::HealthRegistry;
use crate::models::{Dataset, Schema};
use crate::observability::{outcome, ServiceMetrics, StructuredLogger};
use crate::store::{ModelBundle, ModelStore};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Default bound on a single refresh
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(120);

/// What started a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Scheduled,
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Startup => "startup",
            RefreshTrigger::Scheduled => "scheduled",
            RefreshTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU-bound stages, shared with the blocking worker
struct Stages {
    preprocessor: Preprocessor,
    trainer: Trainer,
    evaluator: Evaluator,
}

/// A fully trained and scored model not yet published
struct Candidate {
    model: Box<dyn FittedClassifier>,
    schema: Arc<Schema>,
    evaluation: Evaluation,
    train_samples: usize,
    test_samples: usize,
}

impl Stages {
    fn build(&self, dataset: &Dataset) -> Result<Candidate> {
        info!(instances = dataset.len(), "Dataset loaded");

        let (train, test) = self.preprocessor.prepare(dataset)?;
        info!(
            train = train.len(),
            test = test.len(),
            "Dataset preprocessing completed"
        );

        let model = self.trainer.fit(&train)?;
        let evaluation = self.evaluator.evaluate(model.as_ref(), &test)?;
        info!(
            algorithm = self.trainer.algorithm(),
            accuracy = evaluation.accuracy(),
            correct = evaluation.correct,
            total = evaluation.total,
            confusion = ?evaluation.confusion,
            "Model evaluation completed"
        );

        Ok(Candidate {
            model,
            schema: dataset.schema().clone(),
            evaluation,
            train_samples: train.len(),
            test_samples: test.len(),
        })
    }
}

/// Orchestrates refreshes and owns the single-writer gate over the store
pub struct RefreshPipeline {
    provider: Arc<dyn DatasetProvider>,
    stages: Arc<Stages>,
    store: Arc<ModelStore>,
    gate: Mutex<()>,
    timeout: Duration,
    health: HealthRegistry,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl RefreshPipeline {
    pub fn builder() -> RefreshPipelineBuilder {
        RefreshPipelineBuilder::default()
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn describe_source(&self) -> String {
        self.provider.describe()
    }

    /// True while a refresh holds the gate
    pub fn is_refreshing(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Run a refresh, waiting for any refresh already in progress
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<Arc<ModelBundle>> {
        let _guard = self.gate.lock().await;
        self.run_exclusive(trigger).await
    }

    /// Run a refresh unless one is already in progress
    ///
    /// Returns `None` when the trigger was suppressed.
    pub async fn try_refresh(&self, trigger: RefreshTrigger) -> Option<Result<Arc<ModelBundle>>> {
        let Ok(_guard) = self.gate.try_lock() else {
            self.metrics.inc_refresh(outcome::SKIPPED);
            self.logger.log_refresh_skipped(trigger.as_str());
            return None;
        };
        Some(self.run_exclusive(trigger).await)
    }

    async fn run_exclusive(&self, trigger: RefreshTrigger) -> Result<Arc<ModelBundle>> {
        let start = Instant::now();
        info!(trigger = %trigger, source = %self.provider.describe(), "Starting model refresh");

        let result = self.build_and_publish(trigger, start).await;
        self.metrics
            .observe_refresh_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(bundle) => {
                self.metrics.inc_refresh(outcome::SUCCESS);
                self.metrics.set_model(bundle.generation(), bundle.accuracy());
                self.health.record_refresh_success(bundle.generation()).await;
            }
            Err(e) => {
                let serving = self.store.current().ok().map(|b| b.generation());
                self.metrics.inc_refresh(outcome::FAILURE);
                self.logger
                    .log_refresh_failed(trigger.as_str(), e.code(), &e.to_string(), serving);
                self.health.record_refresh_failure(&e.to_string(), serving).await;
            }
        }

        result
    }

    async fn build_and_publish(
        &self,
        trigger: RefreshTrigger,
        start: Instant,
    ) -> Result<Arc<ModelBundle>> {
        let work = async {
            let dataset = self.provider.load().await?;
            let stages = Arc::clone(&self.stages);
            let candidate = tokio::task::spawn_blocking(move || stages.build(&dataset))
                .await
                .map_err(|e| ClassifierError::Training(format!("training task failed: {}", e)))??;
            Ok::<Candidate, ClassifierError>(candidate)
        };

        let candidate = tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| ClassifierError::RefreshTimeout(self.timeout.as_secs()))??;

        // Only this gate-holder publishes, so `previous` cannot change under us.
        let previous = self.store.current().ok();
        let now = Utc::now();
        let (trained_at, generation) = match &previous {
            Some(p) => (now.max(p.trained_at()), p.generation() + 1),
            None => (now, 1),
        };

        let accuracy = candidate.evaluation.accuracy();
        let bundle = ModelBundle::new(
            candidate.model,
            candidate.schema,
            accuracy,
            trained_at,
            generation,
        )?
        .with_partition_sizes(candidate.train_samples, candidate.test_samples);

        let (published, _) = self.store.publish(bundle);

        self.logger.log_refresh(
            trigger.as_str(),
            generation,
            accuracy,
            candidate.evaluation.correct,
            candidate.evaluation.total,
            candidate.train_samples,
            start.elapsed().as_millis() as u64,
        );

        Ok(published)
    }
}

/// Builder for [`RefreshPipeline`]
pub struct RefreshPipelineBuilder {
    provider: Arc<dyn DatasetProvider>,
    classifier: Arc<dyn Classifier>,
    split: SplitConfig,
    timeout: Duration,
    store: Arc<ModelStore>,
    health: HealthRegistry,
    logger: StructuredLogger,
}

impl Default for RefreshPipelineBuilder {
    fn default() -> Self {
        Self {
            provider: Arc::new(IrisDatasetProvider::new()),
            classifier: Arc::new(DecisionTreeClassifier::default()),
            split: SplitConfig::default(),
            timeout: DEFAULT_REFRESH_TIMEOUT,
            store: Arc::new(ModelStore::new()),
            health: HealthRegistry::new(),
            logger: StructuredLogger::new("iris-classifier"),
        }
    }
}

impl RefreshPipelineBuilder {
    pub fn provider(mut self, provider: Arc<dyn DatasetProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(mut self, store: Arc<ModelStore>) -> Self {
        self.store = store;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<RefreshPipeline> {
        if self.timeout.is_zero() {
            return Err(ClassifierError::Configuration(
                "refresh timeout must be positive".to_string(),
            ));
        }

        let stages = Stages {
            preprocessor: Preprocessor::new(self.split)?,
            trainer: Trainer::new(self.classifier),
            evaluator: Evaluator::new(),
        };

        Ok(RefreshPipeline {
            provider: self.provider,
            stages: Arc::new(stages),
            store: self.store,
            gate: Mutex::new(()),
            timeout: self.timeout,
            health: self.health,
            metrics: ServiceMetrics::new(),
            logger: self.logger,
        })
    }
}
