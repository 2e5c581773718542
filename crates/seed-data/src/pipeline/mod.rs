//! Dependency-ordered generation pipeline.
//!
//! [`StageGraph`] fixes the stage order; [`Orchestrator`] runs each stage once
//! in that order against a single seeded rng and checks the finished dataset.

mod graph;
mod orchestrator;

pub use graph::{Stage, StageGraph};
pub use orchestrator::{Orchestrator, RunOutput, StageTiming};
