//! Fluent builder APIs for task-board scenarios.
//!
//! The [`ScenarioBuilder`] wraps a [`SimulationConfig`](crate::config::SimulationConfig)
//! with setters for the common volume knobs and a few named presets.

mod scenario;

pub use scenario::{ScenarioBuilder, ScenarioMetrics, ScenarioResult};
