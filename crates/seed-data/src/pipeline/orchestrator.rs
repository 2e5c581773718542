//! Runs the entity stages in dependency order.

use std::collections::BTreeSet;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use super::{Stage, StageGraph};
use crate::config::SimulationConfig;
use crate::dataset::Dataset;
use crate::errors::GenerationError;
use crate::generators::{
    CommentGenerator, MembershipGenerator, OrganizationGenerator, ProjectGenerator,
    SectionGenerator, SubtaskGenerator, TaskGenerator, TeamGenerator, UserGenerator,
};
use crate::temporal::Calendar;
use crate::validate::{self, DatasetReport};

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub records: usize,
    pub millis: u128,
}

/// A validated dataset together with its quality report.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub report: DatasetReport,
    pub timings: Vec<StageTiming>,
}

/// Executes each stage of a [`StageGraph`] exactly once.
pub struct Orchestrator<'a> {
    config: &'a SimulationConfig,
    calendar: Calendar,
    graph: StageGraph,
}

impl<'a> Orchestrator<'a> {
    /// Validates the configuration and prepares the standard stage graph.
    pub fn new(config: &'a SimulationConfig) -> Result<Self, GenerationError> {
        Self::with_graph(config, StageGraph::standard()?)
    }

    pub fn with_graph(
        config: &'a SimulationConfig,
        graph: StageGraph,
    ) -> Result<Self, GenerationError> {
        config.validate()?;
        let calendar = Calendar::new(config.now, &config.calendar)?;
        Ok(Self {
            config,
            calendar,
            graph,
        })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Generates and checks a dataset from the configured seed.
    pub fn run(&self) -> Result<RunOutput, GenerationError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        info!(
            "Generating dataset (seed {}, now {})",
            self.config.seed,
            self.calendar.now()
        );

        let mut dataset = Dataset::default();
        let mut completed = BTreeSet::new();
        let mut timings = Vec::with_capacity(self.graph.order().len());

        for &stage in self.graph.order() {
            if let Some(missing) = stage.dependencies().iter().find(|d| !completed.contains(*d)) {
                return Err(GenerationError::StageNotRun {
                    stage,
                    requires: *missing,
                });
            }

            let started = Instant::now();
            self.run_stage(stage, &mut dataset, &mut rng)?;
            let records = dataset.stage_len(stage);
            let millis = started.elapsed().as_millis();

            info!("Generated {} {}", records, stage);
            debug!("Stage {} took {}ms", stage, millis);
            timings.push(StageTiming {
                stage,
                records,
                millis,
            });
            completed.insert(stage);
        }

        let report = validate::check(&dataset, self.config, &self.calendar)?;
        info!(
            "Dataset valid: {} tasks, {:.1}% complete, {:.1}% commented",
            report.counts.tasks,
            report.completed_task_fraction * 100.0,
            report.commented_task_fraction * 100.0
        );

        Ok(RunOutput {
            dataset,
            report,
            timings,
        })
    }

    fn run_stage(
        &self,
        stage: Stage,
        dataset: &mut Dataset,
        rng: &mut StdRng,
    ) -> Result<(), GenerationError> {
        let (config, calendar) = (self.config, &self.calendar);

        match stage {
            Stage::Organization => {
                dataset.organization =
                    Some(OrganizationGenerator::new(config, calendar).generate(rng));
            }
            Stage::Teams => {
                let org = dataset.organization(stage)?;
                dataset.teams = TeamGenerator::new(config, calendar).generate(org, rng)?;
            }
            Stage::Users => {
                let org = dataset.organization(stage)?;
                dataset.users = UserGenerator::new(config, calendar).generate(org, rng)?;
            }
            Stage::Memberships => {
                dataset.memberships = MembershipGenerator::new(config, calendar).generate(
                    &dataset.teams,
                    &dataset.users,
                    rng,
                )?;
            }
            Stage::Projects => {
                let org = dataset.organization(stage)?;
                dataset.projects =
                    ProjectGenerator::new(config, calendar).generate(org, &dataset.teams, rng)?;
            }
            Stage::Sections => {
                dataset.sections = SectionGenerator::new(config).generate(&dataset.projects, rng);
            }
            Stage::Tasks => {
                let org = dataset.organization(stage)?;
                dataset.tasks = TaskGenerator::new(config, calendar).generate(
                    org,
                    &dataset.users,
                    &dataset.memberships,
                    &dataset.projects,
                    &dataset.sections,
                    rng,
                )?;
            }
            Stage::Subtasks => {
                let org = dataset.organization(stage)?;
                dataset.subtasks =
                    SubtaskGenerator::new(config, calendar).generate(org, &dataset.tasks, rng);
            }
            Stage::Comments => {
                dataset.comments = CommentGenerator::new(config, calendar).generate(
                    &mut dataset.tasks,
                    &dataset.subtasks,
                    &dataset.projects,
                    &dataset.memberships,
                    rng,
                )?;
            }
        }

        Ok(())
    }
}
