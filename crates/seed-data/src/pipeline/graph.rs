//! Stage dependency graph.
//!
//! Each entity stage declares the stages whose output it consumes. The graph
//! is sorted once with Kahn's algorithm. Among ready stages the one that comes
//! first in [`Stage`] runs first, whatever order the edges were given in, so
//! the standard graph yields [`Stage::ALL`] in order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::errors::GenerationError;

/// One entity stage of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Organization,
    Teams,
    Users,
    Memberships,
    Projects,
    Sections,
    Tasks,
    Subtasks,
    Comments,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Organization,
        Stage::Teams,
        Stage::Users,
        Stage::Memberships,
        Stage::Projects,
        Stage::Sections,
        Stage::Tasks,
        Stage::Subtasks,
        Stage::Comments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Organization => "organization",
            Stage::Teams => "teams",
            Stage::Users => "users",
            Stage::Memberships => "memberships",
            Stage::Projects => "projects",
            Stage::Sections => "sections",
            Stage::Tasks => "tasks",
            Stage::Subtasks => "subtasks",
            Stage::Comments => "comments",
        }
    }

    /// Stages whose records this stage reads.
    pub fn dependencies(&self) -> &'static [Stage] {
        match self {
            Stage::Organization => &[],
            Stage::Teams => &[Stage::Organization],
            Stage::Users => &[Stage::Organization],
            Stage::Memberships => &[Stage::Teams, Stage::Users],
            Stage::Projects => &[Stage::Organization, Stage::Teams],
            Stage::Sections => &[Stage::Projects],
            Stage::Tasks => &[
                Stage::Organization,
                Stage::Users,
                Stage::Memberships,
                Stage::Projects,
                Stage::Sections,
            ],
            Stage::Subtasks => &[Stage::Organization, Stage::Tasks],
            Stage::Comments => &[
                Stage::Users,
                Stage::Memberships,
                Stage::Projects,
                Stage::Tasks,
                Stage::Subtasks,
            ],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated, topologically sorted set of stages.
#[derive(Debug, Clone)]
pub struct StageGraph {
    order: Vec<Stage>,
}

impl StageGraph {
    /// The full nine-stage pipeline.
    pub fn standard() -> Result<Self, GenerationError> {
        Self::from_dependencies(
            Stage::ALL
                .iter()
                .map(|stage| (*stage, stage.dependencies().to_vec())),
        )
    }

    /// Builds a graph from explicit `(stage, dependencies)` edges.
    pub fn from_dependencies(
        edges: impl IntoIterator<Item = (Stage, Vec<Stage>)>,
    ) -> Result<Self, GenerationError> {
        let edges: BTreeMap<Stage, BTreeSet<Stage>> = edges
            .into_iter()
            .map(|(stage, deps)| (stage, deps.into_iter().collect()))
            .collect();

        for (stage, deps) in &edges {
            if let Some(missing) = deps.iter().find(|dep| !edges.contains_key(dep)) {
                return Err(GenerationError::UnknownDependency {
                    stage: *stage,
                    missing: *missing,
                });
            }
        }

        let mut remaining: BTreeMap<Stage, usize> = edges
            .iter()
            .map(|(stage, deps)| (*stage, deps.len()))
            .collect();
        let mut ready: BTreeSet<Stage> = remaining
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(stage, _)| *stage)
            .collect();
        let mut order = Vec::with_capacity(edges.len());

        while let Some(stage) = ready.pop_first() {
            remaining.remove(&stage);
            order.push(stage);

            for (dependent, deps) in &edges {
                if !deps.contains(&stage) {
                    continue;
                }
                if let Some(n) = remaining.get_mut(dependent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            return Err(GenerationError::DependencyCycle(
                remaining.into_keys().collect(),
            ));
        }

        Ok(Self { order })
    }

    /// Stages in execution order.
    pub fn order(&self) -> &[Stage] {
        &self.order
    }

    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.order.iter().position(|s| *s == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let graph = StageGraph::standard().unwrap();
        assert_eq!(graph.order(), &Stage::ALL);
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let graph = StageGraph::standard().unwrap();
        for stage in Stage::ALL {
            let pos = graph.position(stage).unwrap();
            for dep in stage.dependencies() {
                assert!(
                    graph.position(*dep).unwrap() < pos,
                    "{dep} must run before {stage}"
                );
            }
        }
    }

    #[test]
    fn test_cycle_rejected() {
        let result = StageGraph::from_dependencies([
            (Stage::Organization, vec![]),
            (Stage::Tasks, vec![Stage::Comments]),
            (Stage::Comments, vec![Stage::Tasks]),
        ]);

        match result {
            Err(GenerationError::DependencyCycle(stages)) => {
                assert_eq!(stages, vec![Stage::Tasks, Stage::Comments]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let result = StageGraph::from_dependencies([(Stage::Teams, vec![Stage::Organization])]);
        assert!(matches!(
            result,
            Err(GenerationError::UnknownDependency {
                stage: Stage::Teams,
                missing: Stage::Organization,
            })
        ));
    }

    #[test]
    fn test_repeated_dependency_counted_once() {
        let graph = StageGraph::from_dependencies([
            (Stage::Organization, vec![]),
            (Stage::Teams, vec![Stage::Organization, Stage::Organization]),
        ])
        .unwrap();

        assert_eq!(graph.order(), &[Stage::Organization, Stage::Teams]);
    }

    #[test]
    fn test_ready_stages_run_in_stage_order() {
        let graph = StageGraph::from_dependencies([
            (Stage::Users, vec![]),
            (Stage::Teams, vec![]),
            (Stage::Organization, vec![]),
        ])
        .unwrap();

        assert_eq!(
            graph.order(),
            &[Stage::Organization, Stage::Teams, Stage::Users]
        );
    }
}
