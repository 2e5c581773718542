//! Configuration types for fixture generation.
//!
//! [`SimulationConfig`] is built once per run (defaults, then an optional JSON
//! file, then `SIM_*` environment overrides), validated, and handed to every
//! generator by reference.

use std::path::{Path, PathBuf};

use board::{MembershipRole, Priority, ProjectType};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, Weekday};

use crate::errors::GenerationError;
use crate::sampling::{CountRange, FractionRange, WeightedTable, check_probability};

/// Root configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the single random stream of the run.
    pub seed: u64,

    /// Timestamp treated as the present. `None` means the current UTC time.
    #[serde(with = "time::serde::rfc3339::option")]
    pub now: Option<OffsetDateTime>,

    pub organization: OrganizationConfig,
    pub volume: VolumeConfig,
    pub task: TaskConfig,
    pub project: ProjectConfig,
    pub subtask: SubtaskConfig,
    pub comment: CommentConfig,
    pub people: PeopleConfig,
    pub calendar: CalendarConfig,
    pub distributions: DistributionConfig,
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            now: None,
            organization: OrganizationConfig::default(),
            volume: VolumeConfig::default(),
            task: TaskConfig::default(),
            project: ProjectConfig::default(),
            subtask: SubtaskConfig::default(),
            comment: CommentConfig::default(),
            people: PeopleConfig::default(),
            calendar: CalendarConfig::default(),
            distributions: DistributionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    pub name: String,
    pub domain: String,
    /// How long ago the organization was founded, in years.
    pub age_years: CountRange,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "Acme Global Solutions".to_string(),
            domain: "acme-corp.com".to_string(),
            age_years: CountRange::new(8, 15),
        }
    }
}

/// Entity volumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub teams: CountRange,
    pub users: CountRange,
    pub projects_per_team: CountRange,
    pub tasks_per_project: CountRange,
    pub subtasks_per_task: CountRange,
    pub comments_per_task: CountRange,
    /// Share of tasks that get subtasks; one value is drawn per run.
    pub subtask_task_fraction: FractionRange,
    /// Share of tasks that get a comment thread.
    pub commented_task_fraction: f64,
    /// Chance that a thread on a task with subtasks lands on one of them.
    pub subtask_comment_probability: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            teams: CountRange::new(8, 15).with_mode_bias(2.0),
            users: CountRange::new(3_000, 8_000).with_mode_bias(800.0),
            projects_per_team: CountRange::new(3, 10).with_mode_bias(1.0),
            tasks_per_project: CountRange::new(40, 120).with_mode_bias(10.0),
            subtasks_per_task: CountRange::new(2, 6),
            comments_per_task: CountRange::new(1, 5),
            subtask_task_fraction: FractionRange::new(0.30, 0.40),
            commented_task_fraction: 0.20,
            subtask_comment_probability: 0.25,
        }
    }
}

/// Longest day window or completion delay a config may ask for.
pub const MAX_WINDOW_DAYS: i64 = 3_650;

/// Oldest organization a config may ask for.
pub const MAX_ORGANIZATION_AGE_YEARS: usize = 100;

/// Inclusive window of whole days, at most [`MAX_WINDOW_DAYS`] long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub min: i64,
    pub max: i64,
}

impl DayWindow {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    fn validate(&self, parameter: &str) -> Result<(), GenerationError> {
        if self.min < 0 || self.min > self.max || self.max > MAX_WINDOW_DAYS {
            return Err(GenerationError::config(
                parameter,
                format!("window [{}, {}] is not a valid day range", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub completion_ratio: f64,
    pub unassigned_probability: f64,
    /// Share of due-dated, incomplete tasks whose due date lies in the past.
    pub overdue_fraction: f64,
    /// Due-date probability for roadmap, sprint and launch projects.
    pub planned_due_probability: f64,
    /// Due-date probability for everything else.
    pub unplanned_due_probability: f64,
    pub planned_due_days: DayWindow,
    pub unplanned_due_days: DayWindow,
    /// Offset from today for open tasks that are not overdue.
    pub rescheduled_due_days: DayWindow,
    pub completion_max_days: i64,
    pub completed_in_terminal_section: f64,
    pub creator_is_assignee: f64,
    pub candidate_prefix_probability: f64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            completion_ratio: 0.65,
            unassigned_probability: 0.20,
            overdue_fraction: 0.10,
            planned_due_probability: 0.85,
            unplanned_due_probability: 0.35,
            planned_due_days: DayWindow::new(3, 75),
            unplanned_due_days: DayWindow::new(5, 45),
            rescheduled_due_days: DayWindow::new(1, 30),
            completion_max_days: 60,
            completed_in_terminal_section: 0.7,
            creator_is_assignee: 0.6,
            candidate_prefix_probability: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Chance that a project whose due date has passed is complete.
    pub completion_ratio_when_past_due: f64,
    /// Chance that a completed project is archived.
    pub archive_probability: f64,
    pub long_due_days: DayWindow,
    pub sprint_due_days: DayWindow,
    pub completion_max_days: i64,
    /// Chance that an ops board drops one middle column.
    pub shortened_ops_workflow_probability: f64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            completion_ratio_when_past_due: 0.7,
            archive_probability: 0.4,
            long_due_days: DayWindow::new(60, 240),
            sprint_due_days: DayWindow::new(10, 21),
            completion_max_days: 365,
            shortened_ops_workflow_probability: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtaskConfig {
    pub completion_when_parent_complete: f64,
    pub completion_when_parent_open: f64,
    /// Minimum acceptable completion rate of subtasks under completed parents.
    pub correlation_floor: f64,
    pub share_parent_due_probability: f64,
    pub own_due_days: DayWindow,
    pub unassign_probability: f64,
    pub completion_max_days: i64,
}

impl Default for SubtaskConfig {
    fn default() -> Self {
        Self {
            completion_when_parent_complete: 0.9,
            completion_when_parent_open: 0.3,
            correlation_floor: 0.85,
            share_parent_due_probability: 0.8,
            own_due_days: DayWindow::new(1, 30),
            unassign_probability: 0.15,
            completion_max_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    pub author_is_assignee: f64,
    /// Chance of a canned snippet rather than a generated sentence.
    pub snippet_probability: f64,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            author_is_assignee: 0.4,
            snippet_probability: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeopleConfig {
    pub inactive_probability: f64,
    pub join_window_days: i64,
    /// Weight multiplier of a role-preferred team over any other team.
    pub role_affinity_weight: f64,
}

impl Default for PeopleConfig {
    fn default() -> Self {
        Self {
            inactive_probability: 0.03,
            join_window_days: 365 * 3,
            role_affinity_weight: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub business_days: Vec<Weekday>,
    /// Beta(alpha, beta) shape for recency-skewed timestamps.
    pub recency_alpha: f64,
    pub recency_beta: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            business_days: vec![
                Weekday::Monday,
                Weekday::Tuesday,
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
            ],
            recency_alpha: 2.0,
            recency_beta: 5.0,
        }
    }
}

/// Job title together with the teams its holders gravitate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub title: String,
    pub teams: Vec<String>,
    /// Managers, leads and staff draw lead-heavy membership roles.
    #[serde(default)]
    pub manages: bool,
}

impl RoleProfile {
    fn new(title: &str, teams: &[&str], manages: bool) -> Self {
        Self {
            title: title.to_string(),
            teams: teams.iter().map(|t| t.to_string()).collect(),
            manages,
        }
    }
}

/// Categorical distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub roles: WeightedTable<RoleProfile>,
    pub locations: WeightedTable<String>,
    pub project_types: WeightedTable<ProjectType>,
    pub priorities: WeightedTable<Priority>,
    pub membership_roles: WeightedTable<MembershipRole>,
    pub manager_membership_roles: WeightedTable<MembershipRole>,
    pub membership_counts: WeightedTable<usize>,
    /// Team catalog; teams are drawn from it without replacement.
    pub teams: WeightedTable<String>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        const ENGINEERING: &[&str] = &["Engineering", "Security", "IT"];
        const PRODUCT: &[&str] = &["Product", "Program Management"];
        const ACCOUNTS: &[&str] = &["Customer Success", "Sales"];

        let roles = WeightedTable::from_pairs([
            (RoleProfile::new("Software Engineer", ENGINEERING, false), 0.22),
            (RoleProfile::new("Senior Software Engineer", ENGINEERING, false), 0.13),
            (RoleProfile::new("Staff Engineer", ENGINEERING, true), 0.04),
            (RoleProfile::new("Product Manager", PRODUCT, true), 0.07),
            (RoleProfile::new("Product Owner", PRODUCT, false), 0.03),
            (RoleProfile::new("Product Designer", &["Design", "Product"], false), 0.07),
            (RoleProfile::new("Design Lead", &["Design"], true), 0.02),
            (RoleProfile::new("Data Scientist", &["Data"], false), 0.06),
            (RoleProfile::new("Data Analyst", &["Data"], false), 0.04),
            (RoleProfile::new("Sales Executive", &["Sales"], false), 0.06),
            (RoleProfile::new("Account Manager", ACCOUNTS, true), 0.05),
            (RoleProfile::new("Customer Success Manager", ACCOUNTS, true), 0.04),
            (RoleProfile::new("Sales Engineer", &["Sales", "Engineering"], false), 0.03),
            (
                RoleProfile::new("QA Engineer", &["Quality Assurance", "Engineering"], false),
                0.04,
            ),
            (RoleProfile::new("IT Support Specialist", &["IT"], false), 0.03),
            (
                RoleProfile::new("Security Engineer", &["Security", "Engineering"], false),
                0.02,
            ),
            (
                RoleProfile::new("Finance Analyst", &["Finance", "Business Operations"], false),
                0.02,
            ),
            (
                RoleProfile::new(
                    "People Ops Specialist",
                    &["People Operations", "Recruiting"],
                    false,
                ),
                0.02,
            ),
        ]);

        let locations = WeightedTable::from_pairs(
            [
                ("New York", 0.18),
                ("San Francisco", 0.15),
                ("Austin", 0.10),
                ("London", 0.12),
                ("Dublin", 0.08),
                ("Toronto", 0.07),
                ("Bangalore", 0.10),
                ("Remote - US", 0.12),
                ("Remote - EMEA", 0.05),
                ("Remote - APAC", 0.03),
            ]
            .map(|(name, w)| (name.to_string(), w)),
        );

        let teams = WeightedTable::from_pairs(
            [
                ("Engineering", 0.20),
                ("Product", 0.14),
                ("Design", 0.10),
                ("Marketing", 0.10),
                ("Sales", 0.10),
                ("Customer Success", 0.06),
                ("Data", 0.05),
                ("IT", 0.04),
                ("Security", 0.03),
                ("Finance", 0.03),
                ("People Operations", 0.03),
                ("Recruiting", 0.03),
                ("Quality Assurance", 0.03),
                ("Business Operations", 0.03),
                ("Program Management", 0.03),
            ]
            .map(|(name, w)| (name.to_string(), w)),
        );

        Self {
            roles,
            locations,
            project_types: WeightedTable::from_pairs([
                (ProjectType::Roadmap, 0.25),
                (ProjectType::Sprint, 0.35),
                (ProjectType::Launch, 0.20),
                (ProjectType::Ops, 0.20),
            ]),
            priorities: WeightedTable::from_pairs([
                (Priority::Low, 0.30),
                (Priority::Medium, 0.40),
                (Priority::High, 0.20),
                (Priority::Urgent, 0.10),
            ]),
            membership_roles: WeightedTable::from_pairs([
                (MembershipRole::Member, 0.93),
                (MembershipRole::Lead, 0.07),
            ]),
            manager_membership_roles: WeightedTable::from_pairs([
                (MembershipRole::Lead, 0.7),
                (MembershipRole::Member, 0.3),
            ]),
            membership_counts: WeightedTable::from_pairs([(1, 0.70), (2, 0.25), (3, 0.05)]),
            teams,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Rows written between seeding progress reports.
    pub batch_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output/task_board.sqlite"),
            batch_size: 500,
        }
    }
}

impl SimulationConfig {
    /// Reads a JSON document; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GenerationError::config("SIM_CONFIG", format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| GenerationError::config("SIM_CONFIG", format!("{}: {e}", path.display())))
    }

    /// Builds the run configuration from `SIM_CONFIG`, `SIM_SEED`, `SIM_NOW`
    /// and `SIM_OUTPUT`, then validates it.
    pub fn from_env() -> Result<Self, GenerationError> {
        let mut config = match std::env::var("SIM_CONFIG") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(seed) = std::env::var("SIM_SEED") {
            config.seed = seed
                .trim()
                .parse()
                .map_err(|e| GenerationError::config("SIM_SEED", format!("{seed:?}: {e}")))?;
        }

        if let Ok(now) = std::env::var("SIM_NOW") {
            config.now = Some(
                OffsetDateTime::parse(now.trim(), &Rfc3339)
                    .map_err(|e| GenerationError::config("SIM_NOW", format!("{now:?}: {e}")))?,
            );
        }

        if let Ok(output) = std::env::var("SIM_OUTPUT") {
            config.output.path = PathBuf::from(output);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks every range, probability and table before generation starts.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.organization.name.trim().is_empty() {
            return Err(GenerationError::config("organization.name", "must not be empty"));
        }
        if self.organization.domain.trim().is_empty() {
            return Err(GenerationError::config("organization.domain", "must not be empty"));
        }
        self.organization.age_years.validate("organization.age_years", 1)?;
        if self.organization.age_years.max > MAX_ORGANIZATION_AGE_YEARS {
            return Err(GenerationError::config(
                "organization.age_years",
                format!("at most {MAX_ORGANIZATION_AGE_YEARS} years"),
            ));
        }
        if let Some(now) = self.now {
            if !(1900..=9000).contains(&now.year()) {
                return Err(GenerationError::config(
                    "now",
                    format!("year {} is outside 1900..=9000", now.year()),
                ));
            }
        }

        let v = &self.volume;
        v.teams.validate("volume.teams", 1)?;
        v.users.validate("volume.users", 1)?;
        v.projects_per_team.validate("volume.projects_per_team", 0)?;
        v.tasks_per_project.validate("volume.tasks_per_project", 0)?;
        v.subtasks_per_task.validate("volume.subtasks_per_task", 1)?;
        v.comments_per_task.validate("volume.comments_per_task", 1)?;
        v.subtask_task_fraction.validate("volume.subtask_task_fraction")?;
        check_probability("volume.commented_task_fraction", v.commented_task_fraction)?;
        check_probability(
            "volume.subtask_comment_probability",
            v.subtask_comment_probability,
        )?;

        let t = &self.task;
        for (name, p) in [
            ("task.completion_ratio", t.completion_ratio),
            ("task.unassigned_probability", t.unassigned_probability),
            ("task.overdue_fraction", t.overdue_fraction),
            ("task.planned_due_probability", t.planned_due_probability),
            ("task.unplanned_due_probability", t.unplanned_due_probability),
            (
                "task.completed_in_terminal_section",
                t.completed_in_terminal_section,
            ),
            ("task.creator_is_assignee", t.creator_is_assignee),
            (
                "task.candidate_prefix_probability",
                t.candidate_prefix_probability,
            ),
        ] {
            check_probability(name, p)?;
        }
        t.planned_due_days.validate("task.planned_due_days")?;
        t.unplanned_due_days.validate("task.unplanned_due_days")?;
        t.rescheduled_due_days.validate("task.rescheduled_due_days")?;
        if t.rescheduled_due_days.min < 1 {
            return Err(GenerationError::config(
                "task.rescheduled_due_days",
                "rescheduled due dates must lie after today",
            ));
        }
        check_positive_days("task.completion_max_days", t.completion_max_days)?;

        let p = &self.project;
        check_probability(
            "project.completion_ratio_when_past_due",
            p.completion_ratio_when_past_due,
        )?;
        check_probability("project.archive_probability", p.archive_probability)?;
        check_probability(
            "project.shortened_ops_workflow_probability",
            p.shortened_ops_workflow_probability,
        )?;
        p.long_due_days.validate("project.long_due_days")?;
        p.sprint_due_days.validate("project.sprint_due_days")?;
        check_positive_days("project.completion_max_days", p.completion_max_days)?;

        let s = &self.subtask;
        for (name, p) in [
            (
                "subtask.completion_when_parent_complete",
                s.completion_when_parent_complete,
            ),
            (
                "subtask.completion_when_parent_open",
                s.completion_when_parent_open,
            ),
            ("subtask.correlation_floor", s.correlation_floor),
            (
                "subtask.share_parent_due_probability",
                s.share_parent_due_probability,
            ),
            ("subtask.unassign_probability", s.unassign_probability),
        ] {
            check_probability(name, p)?;
        }
        if s.completion_when_parent_complete < s.correlation_floor {
            return Err(GenerationError::config(
                "subtask.completion_when_parent_complete",
                format!(
                    "{} is below the correlation floor {}",
                    s.completion_when_parent_complete, s.correlation_floor
                ),
            ));
        }
        s.own_due_days.validate("subtask.own_due_days")?;
        check_positive_days("subtask.completion_max_days", s.completion_max_days)?;

        check_probability("comment.author_is_assignee", self.comment.author_is_assignee)?;
        check_probability(
            "comment.snippet_probability",
            self.comment.snippet_probability,
        )?;

        check_probability(
            "people.inactive_probability",
            self.people.inactive_probability,
        )?;
        check_positive_days("people.join_window_days", self.people.join_window_days)?;
        if !(self.people.role_affinity_weight.is_finite() && self.people.role_affinity_weight > 0.0)
        {
            return Err(GenerationError::config(
                "people.role_affinity_weight",
                "must be a positive number",
            ));
        }

        if self.calendar.business_days.is_empty() {
            return Err(GenerationError::config(
                "calendar.business_days",
                "at least one business day is required",
            ));
        }
        for (name, shape) in [
            ("calendar.recency_alpha", self.calendar.recency_alpha),
            ("calendar.recency_beta", self.calendar.recency_beta),
        ] {
            if !(shape.is_finite() && shape > 0.0) {
                return Err(GenerationError::config(name, "Beta shape must be positive"));
            }
        }

        let d = &self.distributions;
        d.roles.validate("distributions.roles")?;
        d.locations.validate("distributions.locations")?;
        d.project_types.validate("distributions.project_types")?;
        d.priorities.validate("distributions.priorities")?;
        d.membership_roles.validate("distributions.membership_roles")?;
        d.manager_membership_roles
            .validate("distributions.manager_membership_roles")?;
        d.membership_counts.validate("distributions.membership_counts")?;
        d.teams.validate("distributions.teams")?;

        if let Some(zero) = d.membership_counts.entries().iter().find(|e| e.value == 0) {
            return Err(GenerationError::config(
                "distributions.membership_counts",
                format!("count 0 has weight {}; every user joins a team", zero.weight),
            ));
        }
        let catalog = d.teams.entries().iter().filter(|e| e.weight > 0.0).count();
        if v.teams.max > catalog {
            return Err(GenerationError::config(
                "volume.teams",
                format!("max {} exceeds the {catalog} drawable catalog teams", v.teams.max),
            ));
        }

        if self.output.batch_size == 0 {
            return Err(GenerationError::config("output.batch_size", "must be positive"));
        }

        Ok(())
    }
}

fn check_positive_days(parameter: &str, days: i64) -> Result<(), GenerationError> {
    if days > 0 && days <= MAX_WINDOW_DAYS {
        Ok(())
    } else {
        Err(GenerationError::config(
            parameter,
            format!("{days} is not within 1..={MAX_WINDOW_DAYS} days"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{
                "seed": 7,
                "now": "2025-06-02T12:00:00Z",
                "volume": { "teams": { "min": 10, "max": 10 } },
                "task": { "completion_ratio": 0.5 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.volume.teams, CountRange::exactly(10));
        assert_eq!(config.volume.users, VolumeConfig::default().users);
        assert_eq!(config.task.completion_ratio, 0.5);
        assert_eq!(config.task.overdue_fraction, 0.10);
        assert_eq!(config.now.unwrap().year(), 2025);
        config.validate().unwrap();
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let mut config = SimulationConfig::default();
        config.task.completion_ratio = 1.2;

        match config.validate() {
            Err(GenerationError::Configuration { parameter, .. }) => {
                assert_eq!(parameter, "task.completion_ratio");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = SimulationConfig::default();
        config.volume.users = CountRange::new(10, 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sum_table_rejected() {
        let mut config = SimulationConfig::default();
        config.distributions.priorities =
            WeightedTable::from_pairs([(Priority::Low, 0.0), (Priority::High, 0.0)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_team_count_bounded_by_catalog() {
        let mut config = SimulationConfig::default();
        config.volume.teams = CountRange::new(8, 16);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_correlation_floor_enforced() {
        let mut config = SimulationConfig::default();
        config.subtask.completion_when_parent_complete = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_business_days_rejected() {
        let mut config = SimulationConfig::default();
        config.calendar.business_days.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let mut config = SimulationConfig::default();
        config.task.completion_max_days = i64::MAX / 2;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.task.planned_due_days = DayWindow::new(3, i64::MAX / 4);
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.people.join_window_days = MAX_WINDOW_DAYS + 1;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.organization.age_years = CountRange::exactly(20_000);
        match config.validate() {
            Err(GenerationError::Configuration { parameter, .. }) => {
                assert_eq!(parameter, "organization.age_years");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }

        let mut config = SimulationConfig::default();
        config.task.planned_due_days = DayWindow::new(3, MAX_WINDOW_DAYS);
        config.organization.age_years = CountRange::exactly(MAX_ORGANIZATION_AGE_YEARS);
        config.validate().unwrap();
    }

    #[test]
    fn test_out_of_range_now_rejected() {
        let mut config = SimulationConfig::default();
        config.now = Some(time::macros::datetime!(9999-12-30 00:00 UTC));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = SimulationConfig::load("/nonexistent/sim.json");
        assert!(matches!(result, Err(GenerationError::Configuration { .. })));
    }
}
