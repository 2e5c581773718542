use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of project, which drives naming, due-date windows and task wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Roadmap,
    Sprint,
    Launch,
    Ops,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Roadmap,
        ProjectType::Sprint,
        ProjectType::Launch,
        ProjectType::Ops,
    ];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Roadmap => "roadmap",
            ProjectType::Sprint => "sprint",
            ProjectType::Launch => "launch",
            ProjectType::Ops => "ops",
        }
    }

    /// Planned work usually carries due dates; ops work mostly does not.
    pub fn is_planned(&self) -> bool {
        !matches!(self, ProjectType::Ops)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// Role a user holds inside one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Member,
    Lead,
}

impl MembershipRole {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Member => "member",
            MembershipRole::Lead => "lead",
        }
    }
}

/// Row counts for every relation in the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCounts {
    pub organizations: usize,
    pub teams: usize,
    pub users: usize,
    pub memberships: usize,
    pub projects: usize,
    pub sections: usize,
    pub tasks: usize,
    pub subtasks: usize,
    pub comments: usize,
}

impl DatasetCounts {
    pub fn total(&self) -> usize {
        self.organizations
            + self.teams
            + self.users
            + self.memberships
            + self.projects
            + self.sections
            + self.tasks
            + self.subtasks
            + self.comments
    }
}

/// How many rows still reference a given user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserFootprint {
    pub memberships: i64,
    pub assigned_tasks: i64,
    pub created_tasks: i64,
    pub assigned_subtasks: i64,
    pub created_subtasks: i64,
    pub authored_comments: i64,
}

impl UserFootprint {
    pub fn is_empty(&self) -> bool {
        *self == UserFootprint::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_strings_match_schema_checks() {
        let types: Vec<_> = ProjectType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(types, ["roadmap", "sprint", "launch", "ops"]);

        let priorities: Vec<_> = Priority::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(priorities, ["low", "medium", "high", "urgent"]);

        assert_eq!(MembershipRole::Lead.as_str(), "lead");
    }

    #[test]
    fn test_planned_types() {
        assert!(ProjectType::Roadmap.is_planned());
        assert!(ProjectType::Sprint.is_planned());
        assert!(!ProjectType::Ops.is_planned());
    }

    #[test]
    fn test_empty_footprint() {
        assert!(UserFootprint::default().is_empty());
        let footprint = UserFootprint {
            memberships: 1,
            ..Default::default()
        };
        assert!(!footprint.is_empty());
    }
}
