//! Task generation.
//!
//! Tasks carry most of the dataset's signal: board placement, assignment from
//! the owning team, creation skewed toward recent history, business-day due
//! dates, a controlled completion ratio and a controlled overdue share.

use std::collections::BTreeMap;

use board::Priority;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    GeneratedOrganization, GeneratedProject, GeneratedSection, GeneratedTeamMembership,
    GeneratedUser, SectionKind, members_by_team,
};
use crate::config::SimulationConfig;
use crate::errors::GenerationError;
use crate::pipeline::Stage;
use crate::sampling::{chance, next_id, weighted_index};
use crate::temporal::Calendar;
use crate::text;

/// Generated task data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub section_id: Option<Uuid>,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
    pub priority: Priority,
}

impl GeneratedTask {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Active columns carry more cards than intake or terminal columns.
const IN_FLIGHT_WEIGHT: f64 = 2.0;
const INTAKE_WEIGHT: f64 = 0.8;
const TERMINAL_WEIGHT: f64 = 0.7;

/// Work items are never created within the last hour, leaving room to complete.
pub(crate) const CREATION_CUTOFF: Duration = Duration::hours(1);

fn section_weight(section: &GeneratedSection) -> f64 {
    match SectionKind::of(&section.name) {
        SectionKind::InFlight => IN_FLIGHT_WEIGHT,
        SectionKind::Intake => INTAKE_WEIGHT,
        SectionKind::Terminal => TERMINAL_WEIGHT,
    }
}

pub struct TaskGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> TaskGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn generate(
        &self,
        organization: &GeneratedOrganization,
        users: &[GeneratedUser],
        memberships: &[GeneratedTeamMembership],
        projects: &[GeneratedProject],
        sections: &[GeneratedSection],
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedTask>, GenerationError> {
        if users.is_empty() {
            return Err(GenerationError::StageNotRun {
                stage: Stage::Tasks,
                requires: Stage::Users,
            });
        }

        let members = members_by_team(memberships);
        let mut columns: BTreeMap<Uuid, Vec<&GeneratedSection>> = BTreeMap::new();
        for section in sections {
            columns.entry(section.project_id).or_default().push(section);
        }

        let mut tasks = Vec::new();
        for project in projects {
            let count = self.config.volume.tasks_per_project.sample(rng);
            let team_members = members.get(&project.team_id).map_or(&[][..], Vec::as_slice);
            let project_columns = columns.get(&project.id).map_or(&[][..], Vec::as_slice);

            for _ in 0..count {
                tasks.push(self.generate_one(
                    organization,
                    project,
                    project_columns,
                    team_members,
                    users,
                    rng,
                )?);
            }
        }

        Ok(tasks)
    }

    fn generate_one(
        &self,
        organization: &GeneratedOrganization,
        project: &GeneratedProject,
        columns: &[&GeneratedSection],
        team_members: &[Uuid],
        users: &[GeneratedUser],
        rng: &mut impl Rng,
    ) -> Result<GeneratedTask, GenerationError> {
        let cfg = &self.config.task;
        let now = self.calendar.now();

        // Tasks of a finished project predate its completion.
        let latest = project
            .completed_at
            .unwrap_or(now)
            .min(now - CREATION_CUTOFF);
        let created_at = self
            .calendar
            .recent_between(project.created_at, latest, rng);

        let priority = *self
            .config
            .distributions
            .priorities
            .draw("distributions.priorities", rng)?;

        let (due_probability, due_window) = if project.project_type.is_planned() {
            (cfg.planned_due_probability, cfg.planned_due_days)
        } else {
            (cfg.unplanned_due_probability, cfg.unplanned_due_days)
        };
        let mut due_date =
            chance(due_probability, rng).then(|| self.calendar.due_from(created_at, due_window, rng));

        let completed_at = if chance(cfg.completion_ratio, rng) {
            self.calendar
                .completion_after(created_at, due_date, cfg.completion_max_days, rng)
        } else {
            None
        };

        if completed_at.is_none() {
            if let Some(due) = due_date {
                due_date = Some(self.schedule_open_task(created_at, due, rng));
            }
        }

        let section = self.pick_section(columns, completed_at.is_some(), rng);
        let name = text::task_title(
            project.project_type,
            section.map(|s| s.name.as_str()),
            cfg.candidate_prefix_probability,
            rng,
        );

        let assignee_id = if chance(cfg.unassigned_probability, rng) {
            None
        } else {
            team_members.choose(rng).copied()
        };

        let created_by_user_id = match assignee_id {
            Some(assignee) if chance(cfg.creator_is_assignee, rng) => assignee,
            _ => match team_members.choose(rng) {
                Some(member) => *member,
                None => users[rng.gen_range(0..users.len())].id,
            },
        };

        let last_activity_at = match completed_at {
            Some(done) => done,
            None => self.calendar.uniform_between(created_at, now, rng),
        };

        Ok(GeneratedTask {
            id: next_id(rng),
            project_id: project.id,
            section_id: section.map(|s| s.id),
            organization_id: organization.id,
            name,
            description: Some(text::task_description(priority, rng)),
            assignee_id,
            created_by_user_id,
            created_at,
            due_date,
            completed_at,
            last_activity_at,
            priority,
        })
    }

    /// Places an open task's due date either in the past (overdue) or on a
    /// business day after today.
    fn schedule_open_task(&self, created_at: OffsetDateTime, due: Date, rng: &mut impl Rng) -> Date {
        let today = self.calendar.today();

        if chance(self.config.task.overdue_fraction, rng) {
            if due < today {
                return due;
            }
            let past = self.calendar.latest_business_day_before(today);
            if past >= created_at.date() {
                return past;
            }
            // Created today with no earlier business day available; fall through.
        }

        if due > today {
            due
        } else {
            self.calendar
                .due_from(self.calendar.now(), self.config.task.rescheduled_due_days, rng)
        }
    }

    fn pick_section<'s>(
        &self,
        columns: &[&'s GeneratedSection],
        complete: bool,
        rng: &mut impl Rng,
    ) -> Option<&'s GeneratedSection> {
        if columns.is_empty() {
            return None;
        }

        if complete && chance(self.config.task.completed_in_terminal_section, rng) {
            if let Some(done) = columns
                .iter()
                .rev()
                .find(|s| SectionKind::of(&s.name) == SectionKind::Terminal)
            {
                return Some(*done);
            }
        }

        let weights: Vec<f64> = columns.iter().map(|s| section_weight(s)).collect();
        weighted_index(&weights, rng).map(|i| columns[i])
    }
}
