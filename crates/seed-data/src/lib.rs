//! Deterministic fixture data for an enterprise task board.
//!
//! One organization with its teams, employees, memberships, projects, workflow
//! sections, tasks, subtasks and comment threads, generated stage by stage
//! from a single seeded rng and written to SQLite through [`board`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let db = Database::create("output/task_board.sqlite").await?;
//! db.apply_schema().await?;
//!
//! let result = ScenarioBuilder::evaluation_benchmark()
//!     .with_seed(42)
//!     .build(&db)
//!     .await?;
//! ```

pub mod builders;
pub mod config;
pub mod dataset;
pub mod db;
pub mod errors;
pub mod generators;
pub mod pipeline;
pub mod sampling;
pub mod temporal;
pub mod text;
pub mod validate;

// Re-export core types from the board crate
pub use board::{Database, DatasetCounts, MembershipRole, Priority, ProjectType};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{ScenarioBuilder, ScenarioMetrics, ScenarioResult};
    pub use crate::config::SimulationConfig;
    pub use crate::dataset::Dataset;
    pub use crate::db::{SeedError, Seeder};
    pub use crate::errors::GenerationError;
    pub use crate::generators::{
        CommentGenerator, MembershipGenerator, OrganizationGenerator, ProjectGenerator,
        SectionGenerator, SubtaskGenerator, TaskGenerator, TeamGenerator, UserGenerator,
    };
    pub use crate::pipeline::{Orchestrator, Stage, StageGraph};
    pub use crate::sampling::{CountRange, FractionRange, WeightedTable};
    pub use crate::temporal::Calendar;
    pub use crate::validate::DatasetReport;
    pub use crate::{Database, DatasetCounts, MembershipRole, Priority, ProjectType};
}
