//! Project generation.

use board::ProjectType;
use rand::Rng;
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::{GeneratedOrganization, GeneratedTeam};
use crate::config::SimulationConfig;
use crate::errors::GenerationError;
use crate::sampling::{chance, next_id};
use crate::temporal::Calendar;
use crate::text;

/// Generated project data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedProject {
    pub id: Uuid,
    pub team_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_type: ProjectType,
    pub start_date: Date,
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub is_archived: bool,
}

/// Teams ramp up for a month before their first project.
const FIRST_PROJECT_AFTER_TEAM: Duration = Duration::days(30);
const LAST_PROJECT_AFTER_TEAM: Duration = Duration::days(900);
/// Projects are at least two weeks old.
const MIN_PROJECT_AGE: Duration = Duration::days(14);

pub struct ProjectGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> ProjectGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn generate(
        &self,
        organization: &GeneratedOrganization,
        teams: &[GeneratedTeam],
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedProject>, GenerationError> {
        let mut projects = Vec::new();

        for team in teams {
            let count = self.config.volume.projects_per_team.sample(rng);
            for _ in 0..count {
                projects.push(self.generate_one(organization, team, rng)?);
            }
        }

        Ok(projects)
    }

    fn generate_one(
        &self,
        organization: &GeneratedOrganization,
        team: &GeneratedTeam,
        rng: &mut impl Rng,
    ) -> Result<GeneratedProject, GenerationError> {
        let cfg = &self.config.project;
        let project_type = *self
            .config
            .distributions
            .project_types
            .draw("distributions.project_types", rng)?;

        let earliest = team.created_at + FIRST_PROJECT_AFTER_TEAM;
        let latest = (team.created_at + LAST_PROJECT_AFTER_TEAM)
            .min(self.calendar.now() - MIN_PROJECT_AGE);
        let created_at = self.calendar.uniform_between(earliest, latest, rng);

        let due_date = match project_type {
            ProjectType::Roadmap | ProjectType::Launch => {
                Some(self.calendar.due_from(created_at, cfg.long_due_days, rng))
            }
            ProjectType::Sprint => Some(self.calendar.due_from(created_at, cfg.sprint_due_days, rng)),
            ProjectType::Ops => None,
        };

        let past_due = due_date.is_some_and(|due| due < self.calendar.today());
        let completed_at = if past_due && chance(cfg.completion_ratio_when_past_due, rng) {
            self.calendar
                .completion_after(created_at, due_date, cfg.completion_max_days, rng)
        } else {
            None
        };
        let is_archived = completed_at.is_some() && chance(cfg.archive_probability, rng);

        Ok(GeneratedProject {
            id: next_id(rng),
            team_id: team.id,
            organization_id: organization.id,
            name: text::project_name(project_type, &team.name, self.calendar.now().year(), rng),
            description: Some(text::project_description(rng)),
            project_type,
            start_date: created_at.date(),
            due_date,
            created_at,
            completed_at,
            is_archived,
        })
    }
}
