//! Error taxonomy for a generation run.

use thiserror::Error;
use uuid::Uuid;

use crate::db::SeedError;
use crate::pipeline::Stage;

/// Any failure that aborts a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {parameter}: {reason}")]
    Configuration { parameter: String, reason: String },

    #[error("Consistency violation in {stage} stage: {entity} {id}: {detail}")]
    ConsistencyViolation {
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        detail: String,
    },

    #[error("Referential error in {stage} stage: {entity} {id} references unknown {target} {missing}")]
    Referential {
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        target: &'static str,
        missing: Uuid,
    },

    #[error("Stage {stage} requires output of stage {requires}, which produced nothing")]
    StageNotRun { stage: Stage, requires: Stage },

    #[error("Stage {stage} depends on {missing}, which is not part of the pipeline")]
    UnknownDependency { stage: Stage, missing: Stage },

    #[error("Dependency cycle among stages {0:?}")]
    DependencyCycle(Vec<Stage>),

    #[error("Store write failed: {0}")]
    StoreWrite(#[from] SeedError),
}

impl GenerationError {
    pub fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::Configuration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn inconsistent(
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        detail: impl Into<String>,
    ) -> Self {
        GenerationError::ConsistencyViolation {
            stage,
            entity,
            id,
            detail: detail.into(),
        }
    }
}
