//! Fluent builder for constructing task-board scenarios.

use std::time::Instant;

use board::{Database, DatasetCounts};
use time::OffsetDateTime;

use crate::config::SimulationConfig;
use crate::dataset::Dataset;
use crate::db::Seeder;
use crate::errors::GenerationError;
use crate::pipeline::{Orchestrator, StageTiming};
use crate::sampling::CountRange;
use crate::validate::DatasetReport;

/// Result of building (and optionally seeding) a scenario.
#[derive(Debug)]
pub struct ScenarioResult {
    pub dataset: Dataset,
    pub report: DatasetReport,
    /// Metrics from scenario generation (populated if metrics tracking enabled).
    pub metrics: Option<ScenarioMetrics>,
}

/// Performance metrics from scenario generation.
#[derive(Debug, Clone)]
pub struct ScenarioMetrics {
    /// Time spent generating and validating data (milliseconds).
    pub generation_time_ms: u64,
    /// Time spent seeding the store (milliseconds, 0 if build_data used).
    pub seeding_time_ms: u64,
    pub stage_timings: Vec<StageTiming>,
    pub counts: DatasetCounts,
}

/// Builder for creating complete task-board scenarios.
///
/// # Example
///
/// ```rust,ignore
/// let result = ScenarioBuilder::new()
///     .with_seed(7)
///     .with_teams(10)
///     .with_users(5_000)
///     .with_projects_per_team(5)
///     .with_tasks_per_project(80)
///     .with_metrics(true)
///     .build(&db)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    config: SimulationConfig,
    track_metrics: bool,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Creates a new scenario builder with default settings.
    pub fn new() -> Self {
        Self::from_config(SimulationConfig::default())
    }

    /// Starts from an existing configuration, e.g. one read from the environment.
    pub fn from_config(config: SimulationConfig) -> Self {
        Self {
            config,
            track_metrics: false,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Pins the "now" anchor; without it the current UTC time is used.
    pub fn with_now(mut self, now: OffsetDateTime) -> Self {
        self.config.now = Some(now);
        self
    }

    pub fn with_teams(mut self, count: usize) -> Self {
        self.config.volume.teams = CountRange::exactly(count);
        self
    }

    pub fn with_users(mut self, count: usize) -> Self {
        self.config.volume.users = CountRange::exactly(count);
        self
    }

    pub fn with_projects_per_team(mut self, count: usize) -> Self {
        self.config.volume.projects_per_team = CountRange::exactly(count);
        self
    }

    pub fn with_tasks_per_project(mut self, count: usize) -> Self {
        self.config.volume.tasks_per_project = CountRange::exactly(count);
        self
    }

    pub fn with_completion_ratio(mut self, ratio: f64) -> Self {
        self.config.task.completion_ratio = ratio;
        self
    }

    pub fn with_commented_task_fraction(mut self, fraction: f64) -> Self {
        self.config.volume.commented_task_fraction = fraction;
        self
    }

    /// Enables metrics tracking for performance analysis.
    ///
    /// When enabled, the result will include timing and count metrics
    /// that can be used for benchmarking.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Builds the scenario (generates data but doesn't seed a store).
    pub fn build_data(&self) -> Result<ScenarioResult, GenerationError> {
        let start_time = self.track_metrics.then(Instant::now);

        let output = Orchestrator::new(&self.config)?.run()?;

        let metrics = start_time.map(|start| ScenarioMetrics {
            generation_time_ms: start.elapsed().as_millis() as u64,
            seeding_time_ms: 0,
            stage_timings: output.timings.clone(),
            counts: output.dataset.counts(),
        });

        Ok(ScenarioResult {
            dataset: output.dataset,
            report: output.report,
            metrics,
        })
    }

    /// Builds the scenario and seeds it into `db`, whose schema must already
    /// be applied.
    pub async fn build(self, db: &Database) -> Result<ScenarioResult, GenerationError> {
        let mut result = self.build_data()?;
        let seed_start = self.track_metrics.then(Instant::now);

        Seeder::new(db.pool().clone())
            .with_batch_size(self.config.output.batch_size)
            .seed(&result.dataset)
            .await?;

        if let (Some(start), Some(metrics)) = (seed_start, result.metrics.as_mut()) {
            metrics.seeding_time_ms = start.elapsed().as_millis() as u64;
        }

        Ok(result)
    }
}

/// Preset scenarios for common needs.
impl ScenarioBuilder {
    /// Full enterprise volume with every default range.
    pub fn enterprise() -> Self {
        Self::new()
    }

    /// Fixed-size scenario used to check the headline distribution targets.
    ///
    /// - 10 teams, 5000 users
    /// - 5 projects per team, 80 tasks per project
    /// - 65% completion, 20% of tasks commented
    pub fn evaluation_benchmark() -> Self {
        Self::new()
            .with_teams(10)
            .with_users(5_000)
            .with_projects_per_team(5)
            .with_tasks_per_project(80)
            .with_completion_ratio(0.65)
            .with_commented_task_fraction(0.20)
            .with_metrics(true)
    }

    /// A few hundred tasks; quick enough for unit tests.
    pub fn small() -> Self {
        Self::new()
            .with_teams(8)
            .with_users(120)
            .with_projects_per_team(2)
            .with_tasks_per_project(25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-04 12:00 UTC);

    #[test]
    fn test_build_data() {
        let result = ScenarioBuilder::small()
            .with_seed(3)
            .with_now(NOW)
            .build_data()
            .unwrap();

        let counts = result.dataset.counts();
        assert_eq!(counts.teams, 8);
        assert_eq!(counts.users, 120);
        assert_eq!(counts.projects, 16);
        assert_eq!(counts.tasks, 400);
        assert_eq!(result.report.counts, counts);
        assert!(result.metrics.is_none());
    }

    #[test]
    fn test_preset_evaluation_benchmark() {
        let builder = ScenarioBuilder::evaluation_benchmark();
        let volume = &builder.config().volume;
        assert_eq!(volume.teams, CountRange::exactly(10));
        assert_eq!(volume.users, CountRange::exactly(5_000));
        assert_eq!(volume.projects_per_team, CountRange::exactly(5));
        assert_eq!(volume.tasks_per_project, CountRange::exactly(80));
        assert!(builder.track_metrics);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = ScenarioBuilder::small()
            .with_now(NOW)
            .with_completion_ratio(1.5)
            .build_data();
        assert!(matches!(
            result,
            Err(GenerationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_metrics_tracking() {
        let result = ScenarioBuilder::small()
            .with_now(NOW)
            .with_metrics(true)
            .build_data()
            .unwrap();

        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.counts, result.dataset.counts());
        assert_eq!(metrics.stage_timings.len(), 9);
        assert_eq!(metrics.seeding_time_ms, 0);
    }

    #[tokio::test]
    async fn test_build_seeds_store() {
        let db = Database::in_memory().await.unwrap();
        db.apply_schema().await.unwrap();

        let result = ScenarioBuilder::small()
            .with_now(NOW)
            .with_metrics(true)
            .build(&db)
            .await
            .unwrap();

        assert_eq!(db.counts().await.unwrap(), result.dataset.counts());
    }
}
