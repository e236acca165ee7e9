//! Retrain scheduling loop
//!
//! Fires scheduled refreshes on a cron expression or a fixed period and
//! exposes the manual trigger used by the admin API. A failed tick is logged
//! and the loop keeps going; the previous model stays published.

use crate::error::{ClassifierError, Result};
use crate::health::{components, HealthRegistry};
use crate::pipeline::{RefreshPipeline, RefreshTrigger};
use crate::store::ModelBundle;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default retrain schedule: every day at 02:00 UTC
pub const DEFAULT_RETRAIN_CRON: &str = "0 0 2 * * *";

/// When scheduled refreshes fire
#[derive(Debug, Clone)]
pub enum Cadence {
    /// Six or seven field cron expression, seconds first
    Cron(Box<Schedule>),
    /// Fixed period between ticks
    Every(Duration),
}

impl Cadence {
    pub fn cron(expression: &str) -> Result<Self> {
        Schedule::from_str(expression)
            .map(|schedule| Cadence::Cron(Box::new(schedule)))
            .map_err(|e| {
                ClassifierError::Configuration(format!(
                    "invalid retrain schedule '{}': {}",
                    expression, e
                ))
            })
    }

    pub fn every(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(ClassifierError::Configuration(
                "retrain interval must be positive".to_string(),
            ));
        }
        Ok(Cadence::Every(period))
    }

    /// Time to wait from `now` until the next tick, if there is one
    pub fn next_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Cadence::Every(period) => Some(*period),
            Cadence::Cron(schedule) => {
                let next = schedule.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::cron(DEFAULT_RETRAIN_CRON).unwrap_or(Cadence::Every(Duration::from_secs(86_400)))
    }
}

/// Drives scheduled and manual refreshes through the pipeline
pub struct RetrainScheduler {
    pipeline: Arc<RefreshPipeline>,
    cadence: Cadence,
    health: HealthRegistry,
}

impl RetrainScheduler {
    pub fn new(pipeline: Arc<RefreshPipeline>, cadence: Cadence, health: HealthRegistry) -> Self {
        Self {
            pipeline,
            cadence,
            health,
        }
    }

    pub fn pipeline(&self) -> &Arc<RefreshPipeline> {
        &self.pipeline
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Manual refresh; waits for a refresh already in progress
    pub async fn trigger_refresh(&self) -> Result<Arc<ModelBundle>> {
        self.pipeline.refresh(RefreshTrigger::Manual).await
    }

    /// Run the scheduling loop until shutdown
    pub async fn run(self: Arc<Self>, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(cadence = ?self.cadence, "Starting retrain scheduler");
        self.health.set_healthy(components::SCHEDULER).await;

        loop {
            let Some(delay) = self.cadence.next_delay(Utc::now()) else {
                warn!("Retrain schedule has no upcoming run, stopping scheduler");
                self.health
                    .set_degraded(components::SCHEDULER, "no upcoming scheduled run")
                    .await;
                break;
            };
            debug!(delay_secs = delay.as_secs(), "Next scheduled refresh");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down retrain scheduler");
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        match self.pipeline.try_refresh(RefreshTrigger::Scheduled).await {
            Some(Ok(bundle)) => {
                debug!(generation = bundle.generation(), "Scheduled refresh completed");
            }
            Some(Err(e)) => {
                // already reported by the pipeline; the loop must survive it
                debug!(error = %e, "Scheduled refresh failed");
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, StubClassifier};
    use chrono::TimeZone;

    fn pipeline(provider: ScriptedProvider) -> Arc<RefreshPipeline> {
        Arc::new(
            RefreshPipeline::builder()
                .provider(Arc::new(provider))
                .classifier(Arc::new(StubClassifier::default()))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_cron_next_delay() {
        let cadence = Cadence::cron(DEFAULT_RETRAIN_CRON).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 1, 30, 0).unwrap();
        assert_eq!(cadence.next_delay(now), Some(Duration::from_secs(30 * 60)));

        let after = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(
            cadence.next_delay(after),
            Some(Duration::from_secs(24 * 3600))
        );
    }

    #[test]
    fn test_invalid_cadence_rejected() {
        assert!(matches!(
            Cadence::cron("every tuesday"),
            Err(ClassifierError::Configuration(_))
        ));
        assert!(matches!(
            Cadence::every(Duration::ZERO),
            Err(ClassifierError::Configuration(_))
        ));
        assert!(matches!(Cadence::default(), Cadence::Cron(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scheduled_ticks_publish_new_generations() {
        let pipeline = pipeline(ScriptedProvider::default());
        pipeline.refresh(RefreshTrigger::Startup).await.unwrap();

        let health = HealthRegistry::new();
        let scheduler = Arc::new(RetrainScheduler::new(
            Arc::clone(&pipeline),
            Cadence::every(Duration::from_millis(50)).unwrap(),
            health.clone(),
        ));

        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(Arc::clone(&scheduler).run(rx));

        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(pipeline.store().current().unwrap().generation() >= 2);
        let status = health.component(components::SCHEDULER).await.unwrap();
        assert!(status.status.is_operational());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failing_ticks_do_not_stop_the_loop() {
        let pipeline = pipeline(ScriptedProvider::failing_after(1));
        let first = pipeline.refresh(RefreshTrigger::Startup).await.unwrap();

        let scheduler = Arc::new(RetrainScheduler::new(
            Arc::clone(&pipeline),
            Cadence::every(Duration::from_millis(20)).unwrap(),
            HealthRegistry::new(),
        ));

        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(Arc::clone(&scheduler).run(rx));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!handle.is_finished());
        tx.send(()).unwrap();
        handle.await.unwrap();

        let current = pipeline.store().current().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_manual_trigger_publishes() {
        let pipeline = pipeline(ScriptedProvider::default());
        let scheduler = RetrainScheduler::new(
            Arc::clone(&pipeline),
            Cadence::default(),
            HealthRegistry::new(),
        );

        assert_eq!(scheduler.trigger_refresh().await.unwrap().generation(), 1);
        assert_eq!(scheduler.trigger_refresh().await.unwrap().generation(), 2);
    }
}
