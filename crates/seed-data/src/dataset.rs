//! The in-memory result of a generation run.

use board::DatasetCounts;
use serde::Serialize;

use crate::errors::GenerationError;
use crate::generators::{
    GeneratedComment, GeneratedOrganization, GeneratedProject, GeneratedSection, GeneratedSubtask,
    GeneratedTask, GeneratedTeam, GeneratedTeamMembership, GeneratedUser,
};
use crate::pipeline::Stage;

/// Every record produced by one run, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub organization: Option<GeneratedOrganization>,
    pub teams: Vec<GeneratedTeam>,
    pub users: Vec<GeneratedUser>,
    pub memberships: Vec<GeneratedTeamMembership>,
    pub projects: Vec<GeneratedProject>,
    pub sections: Vec<GeneratedSection>,
    pub tasks: Vec<GeneratedTask>,
    pub subtasks: Vec<GeneratedSubtask>,
    pub comments: Vec<GeneratedComment>,
}

impl Dataset {
    /// The organization, or [`GenerationError::StageNotRun`] on behalf of `stage`.
    pub fn organization(&self, stage: Stage) -> Result<&GeneratedOrganization, GenerationError> {
        self.organization
            .as_ref()
            .ok_or(GenerationError::StageNotRun {
                stage,
                requires: Stage::Organization,
            })
    }

    pub fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            organizations: usize::from(self.organization.is_some()),
            teams: self.teams.len(),
            users: self.users.len(),
            memberships: self.memberships.len(),
            projects: self.projects.len(),
            sections: self.sections.len(),
            tasks: self.tasks.len(),
            subtasks: self.subtasks.len(),
            comments: self.comments.len(),
        }
    }

    /// Records a stage produced; used for per-stage logging.
    pub fn stage_len(&self, stage: Stage) -> usize {
        match stage {
            Stage::Organization => usize::from(self.organization.is_some()),
            Stage::Teams => self.teams.len(),
            Stage::Users => self.users.len(),
            Stage::Memberships => self.memberships.len(),
            Stage::Projects => self.projects.len(),
            Stage::Sections => self.sections.len(),
            Stage::Tasks => self.tasks.len(),
            Stage::Subtasks => self.subtasks.len(),
            Stage::Comments => self.comments.len(),
        }
    }

    /// Serializes the dataset as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert_eq!(dataset.counts(), DatasetCounts::default());
        assert!(matches!(
            dataset.organization(Stage::Teams),
            Err(GenerationError::StageNotRun {
                stage: Stage::Teams,
                requires: Stage::Organization,
            })
        ));
        assert_eq!(dataset.stage_len(Stage::Comments), 0);
    }
}
