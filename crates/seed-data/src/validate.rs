//! Whole-dataset invariant checks and the quality report.
//!
//! [`check`] runs after the last stage and before anything is written. Any
//! broken reference, duplicate key or out-of-order timestamp aborts the run;
//! distribution targets that drift are only reported.

use std::collections::{BTreeMap, HashMap, HashSet};

use board::DatasetCounts;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::dataset::Dataset;
use crate::errors::GenerationError;
use crate::generators::{CommentTarget, GeneratedTask};
use crate::pipeline::Stage;
use crate::temporal::Calendar;

/// Measured distribution of a valid dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub counts: DatasetCounts,
    pub completed_task_fraction: f64,
    pub unassigned_task_fraction: f64,
    /// Overdue tasks among incomplete tasks with a due date.
    pub overdue_task_fraction: f64,
    pub overdue_tasks: usize,
    pub subtask_task_fraction: f64,
    /// Tasks that own at least one comment, directly or through a subtask.
    pub commented_task_fraction: f64,
    pub subtask_completion_when_parent_complete: Option<f64>,
    pub subtask_completion_when_parent_open: Option<f64>,
}

/// Checks every structural and temporal invariant, then measures the dataset.
pub fn check(
    dataset: &Dataset,
    config: &SimulationConfig,
    calendar: &Calendar,
) -> Result<DatasetReport, GenerationError> {
    Checker::new(dataset, calendar)?.run()?;
    Ok(report(dataset, config, calendar))
}

fn missing(
    stage: Stage,
    entity: &'static str,
    id: Uuid,
    target: &'static str,
    missing: Uuid,
) -> GenerationError {
    GenerationError::Referential {
        stage,
        entity,
        id,
        target,
        missing,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

struct Checker<'a> {
    dataset: &'a Dataset,
    calendar: &'a Calendar,
    now: OffsetDateTime,
    org_id: Uuid,
    org_created: OffsetDateTime,
    teams: HashMap<Uuid, OffsetDateTime>,
    users: HashMap<Uuid, OffsetDateTime>,
    projects: HashMap<Uuid, OffsetDateTime>,
    sections: HashMap<Uuid, Uuid>,
    tasks: HashMap<Uuid, &'a GeneratedTask>,
}

impl<'a> Checker<'a> {
    fn new(dataset: &'a Dataset, calendar: &'a Calendar) -> Result<Self, GenerationError> {
        // Checked once every stage has run.
        let org = dataset.organization(Stage::Comments)?;
        Ok(Self {
            dataset,
            calendar,
            now: calendar.now(),
            org_id: org.id,
            org_created: org.created_at,
            teams: dataset.teams.iter().map(|t| (t.id, t.created_at)).collect(),
            users: dataset.users.iter().map(|u| (u.id, u.joined_at)).collect(),
            projects: dataset
                .projects
                .iter()
                .map(|p| (p.id, p.created_at))
                .collect(),
            sections: dataset
                .sections
                .iter()
                .map(|s| (s.id, s.project_id))
                .collect(),
            tasks: dataset.tasks.iter().map(|t| (t.id, t)).collect(),
        })
    }

    fn run(&self) -> Result<(), GenerationError> {
        self.unique_ids()?;
        self.teams()?;
        self.users()?;
        self.memberships()?;
        self.projects()?;
        self.sections()?;
        self.tasks()?;
        self.subtasks()?;
        self.comments()?;
        Ok(())
    }

    fn unique_ids(&self) -> Result<(), GenerationError> {
        let d = self.dataset;
        let ids = std::iter::once((Stage::Organization, self.org_id))
            .chain(d.teams.iter().map(|r| (Stage::Teams, r.id)))
            .chain(d.users.iter().map(|r| (Stage::Users, r.id)))
            .chain(d.memberships.iter().map(|r| (Stage::Memberships, r.id)))
            .chain(d.projects.iter().map(|r| (Stage::Projects, r.id)))
            .chain(d.sections.iter().map(|r| (Stage::Sections, r.id)))
            .chain(d.tasks.iter().map(|r| (Stage::Tasks, r.id)))
            .chain(d.subtasks.iter().map(|r| (Stage::Subtasks, r.id)))
            .chain(d.comments.iter().map(|r| (Stage::Comments, r.id)));

        let mut seen = HashSet::new();
        for (stage, id) in ids {
            if !seen.insert(id) {
                return Err(GenerationError::inconsistent(
                    stage,
                    "record",
                    id,
                    "duplicate id",
                ));
            }
        }
        Ok(())
    }

    /// `earlier <= later`, else a consistency violation.
    fn ordered(
        &self,
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        earlier: OffsetDateTime,
        later: OffsetDateTime,
        what: &str,
    ) -> Result<(), GenerationError> {
        if earlier > later {
            return Err(GenerationError::inconsistent(
                stage,
                entity,
                id,
                format!("{what} ({later} precedes {earlier})"),
            ));
        }
        Ok(())
    }

    fn not_future(
        &self,
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<(), GenerationError> {
        self.ordered(stage, entity, id, at, self.now, "timestamp lies in the future")
    }

    fn completed_after_created(
        &self,
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        created: OffsetDateTime,
        completed: Option<OffsetDateTime>,
    ) -> Result<(), GenerationError> {
        if let Some(done) = completed {
            if done <= created {
                return Err(GenerationError::inconsistent(
                    stage,
                    entity,
                    id,
                    "completed_at must be after created_at",
                ));
            }
            self.not_future(stage, entity, id, done)?;
        }
        Ok(())
    }

    fn business_due(
        &self,
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        due: Option<Date>,
    ) -> Result<(), GenerationError> {
        match due {
            Some(due) if !self.calendar.is_business_day(due) => {
                Err(GenerationError::inconsistent(
                    stage,
                    entity,
                    id,
                    format!("due date {due} is a {}", due.weekday()),
                ))
            }
            _ => Ok(()),
        }
    }

    fn org(&self, stage: Stage, entity: &'static str, id: Uuid, org: Uuid) -> Result<(), GenerationError> {
        if org != self.org_id {
            return Err(missing(stage, entity, id, "organization", org));
        }
        Ok(())
    }

    fn user(
        &self,
        stage: Stage,
        entity: &'static str,
        id: Uuid,
        user: Option<Uuid>,
    ) -> Result<(), GenerationError> {
        match user {
            Some(user) if !self.users.contains_key(&user) => {
                Err(missing(stage, entity, id, "user", user))
            }
            _ => Ok(()),
        }
    }

    fn teams(&self) -> Result<(), GenerationError> {
        let stage = Stage::Teams;
        let mut names = HashSet::new();
        for team in &self.dataset.teams {
            self.org(stage, "team", team.id, team.organization_id)?;
            self.ordered(
                stage,
                "team",
                team.id,
                self.org_created,
                team.created_at,
                "team predates its organization",
            )?;
            self.not_future(stage, "team", team.id, team.created_at)?;
            if !names.insert(team.name.as_str()) {
                return Err(GenerationError::inconsistent(
                    stage,
                    "team",
                    team.id,
                    format!("duplicate team name {}", team.name),
                ));
            }
        }
        Ok(())
    }

    fn users(&self) -> Result<(), GenerationError> {
        let stage = Stage::Users;
        let mut emails = HashSet::new();
        for user in &self.dataset.users {
            self.org(stage, "user", user.id, user.organization_id)?;
            self.ordered(
                stage,
                "user",
                user.id,
                self.org_created,
                user.joined_at,
                "user joined before the organization existed",
            )?;
            self.not_future(stage, "user", user.id, user.joined_at)?;
            if !emails.insert(user.email.as_str()) {
                return Err(GenerationError::inconsistent(
                    stage,
                    "user",
                    user.id,
                    format!("duplicate email {}", user.email),
                ));
            }
        }
        Ok(())
    }

    fn memberships(&self) -> Result<(), GenerationError> {
        let stage = Stage::Memberships;
        let mut pairs = HashSet::new();
        for m in &self.dataset.memberships {
            let team_created = *self
                .teams
                .get(&m.team_id)
                .ok_or_else(|| missing(stage, "membership", m.id, "team", m.team_id))?;
            let joined = *self
                .users
                .get(&m.user_id)
                .ok_or_else(|| missing(stage, "membership", m.id, "user", m.user_id))?;

            if !pairs.insert((m.team_id, m.user_id)) {
                return Err(GenerationError::inconsistent(
                    stage,
                    "membership",
                    m.id,
                    "user is already a member of this team",
                ));
            }
            self.ordered(
                stage,
                "membership",
                m.id,
                team_created.max(joined),
                m.added_at,
                "added before the team or user existed",
            )?;
            self.not_future(stage, "membership", m.id, m.added_at)?;
        }
        Ok(())
    }

    fn projects(&self) -> Result<(), GenerationError> {
        let stage = Stage::Projects;
        for p in &self.dataset.projects {
            self.org(stage, "project", p.id, p.organization_id)?;
            let team_created = *self
                .teams
                .get(&p.team_id)
                .ok_or_else(|| missing(stage, "project", p.id, "team", p.team_id))?;

            self.ordered(
                stage,
                "project",
                p.id,
                team_created,
                p.created_at,
                "project predates its team",
            )?;
            self.not_future(stage, "project", p.id, p.created_at)?;
            self.completed_after_created(stage, "project", p.id, p.created_at, p.completed_at)?;
            self.business_due(stage, "project", p.id, p.due_date)?;

            if p.is_archived && p.completed_at.is_none() {
                return Err(GenerationError::inconsistent(
                    stage,
                    "project",
                    p.id,
                    "archived project is not complete",
                ));
            }
        }
        Ok(())
    }

    fn sections(&self) -> Result<(), GenerationError> {
        let stage = Stage::Sections;
        let mut orders: BTreeMap<Uuid, Vec<(i64, Uuid)>> = BTreeMap::new();
        for s in &self.dataset.sections {
            let project_created = *self
                .projects
                .get(&s.project_id)
                .ok_or_else(|| missing(stage, "section", s.id, "project", s.project_id))?;
            self.ordered(
                stage,
                "section",
                s.id,
                project_created,
                s.created_at,
                "section predates its project",
            )?;
            orders.entry(s.project_id).or_default().push((s.sort_order, s.id));
        }
        contiguous(stage, "section", orders)
    }

    fn tasks(&self) -> Result<(), GenerationError> {
        let stage = Stage::Tasks;
        for t in &self.dataset.tasks {
            self.org(stage, "task", t.id, t.organization_id)?;
            let project_created = *self
                .projects
                .get(&t.project_id)
                .ok_or_else(|| missing(stage, "task", t.id, "project", t.project_id))?;

            if let Some(section) = t.section_id {
                match self.sections.get(&section) {
                    None => return Err(missing(stage, "task", t.id, "section", section)),
                    Some(owner) if *owner != t.project_id => {
                        return Err(GenerationError::inconsistent(
                            stage,
                            "task",
                            t.id,
                            "section belongs to another project",
                        ));
                    }
                    Some(_) => {}
                }
            }
            self.user(stage, "task", t.id, t.assignee_id)?;
            self.user(stage, "task", t.id, Some(t.created_by_user_id))?;

            self.ordered(
                stage,
                "task",
                t.id,
                project_created,
                t.created_at,
                "task predates its project",
            )?;
            self.not_future(stage, "task", t.id, t.created_at)?;
            self.completed_after_created(stage, "task", t.id, t.created_at, t.completed_at)?;
            self.business_due(stage, "task", t.id, t.due_date)?;

            let floor = t.completed_at.unwrap_or(t.created_at).max(t.created_at);
            self.ordered(
                stage,
                "task",
                t.id,
                floor,
                t.last_activity_at,
                "last activity precedes creation or completion",
            )?;
            self.not_future(stage, "task", t.id, t.last_activity_at)?;
        }
        Ok(())
    }

    fn subtasks(&self) -> Result<(), GenerationError> {
        let stage = Stage::Subtasks;
        let mut orders: BTreeMap<Uuid, Vec<(i64, Uuid)>> = BTreeMap::new();
        for s in &self.dataset.subtasks {
            self.org(stage, "subtask", s.id, s.organization_id)?;
            let parent = *self
                .tasks
                .get(&s.parent_task_id)
                .ok_or_else(|| missing(stage, "subtask", s.id, "task", s.parent_task_id))?;

            if s.project_id != parent.project_id {
                return Err(GenerationError::inconsistent(
                    stage,
                    "subtask",
                    s.id,
                    "project differs from the parent task's project",
                ));
            }
            self.user(stage, "subtask", s.id, s.assignee_id)?;
            self.user(stage, "subtask", s.id, Some(s.created_by_user_id))?;

            self.ordered(
                stage,
                "subtask",
                s.id,
                parent.created_at,
                s.created_at,
                "subtask predates its parent",
            )?;
            self.not_future(stage, "subtask", s.id, s.created_at)?;
            self.completed_after_created(stage, "subtask", s.id, s.created_at, s.completed_at)?;
            self.business_due(stage, "subtask", s.id, s.due_date)?;

            orders
                .entry(s.parent_task_id)
                .or_default()
                .push((s.sort_order, s.id));
        }
        contiguous(stage, "subtask", orders)
    }

    fn comments(&self) -> Result<(), GenerationError> {
        let stage = Stage::Comments;
        let subtasks: HashMap<Uuid, (Uuid, OffsetDateTime)> = self
            .dataset
            .subtasks
            .iter()
            .map(|s| (s.id, (s.parent_task_id, s.created_at)))
            .collect();

        for c in &self.dataset.comments {
            let (target_created, owner) = match c.target {
                CommentTarget::Task(id) => {
                    let task = self
                        .tasks
                        .get(&id)
                        .ok_or_else(|| missing(stage, "comment", c.id, "task", id))?;
                    (task.created_at, *task)
                }
                CommentTarget::Subtask(id) => {
                    let (parent, created) = *subtasks
                        .get(&id)
                        .ok_or_else(|| missing(stage, "comment", c.id, "subtask", id))?;
                    let task = self
                        .tasks
                        .get(&parent)
                        .ok_or_else(|| missing(stage, "comment", c.id, "task", parent))?;
                    (created, *task)
                }
            };
            self.user(stage, "comment", c.id, Some(c.author_id))?;

            if c.body.trim().is_empty() {
                return Err(GenerationError::inconsistent(
                    stage,
                    "comment",
                    c.id,
                    "empty body",
                ));
            }
            self.ordered(
                stage,
                "comment",
                c.id,
                target_created,
                c.created_at,
                "comment predates its target",
            )?;
            self.not_future(stage, "comment", c.id, c.created_at)?;
            self.ordered(
                stage,
                "comment",
                c.id,
                c.created_at,
                owner.last_activity_at,
                "owning task's last activity precedes the comment",
            )?;
        }
        Ok(())
    }
}

/// Sort orders within each group must be exactly `0..n`.
fn contiguous(
    stage: Stage,
    entity: &'static str,
    groups: BTreeMap<Uuid, Vec<(i64, Uuid)>>,
) -> Result<(), GenerationError> {
    for (_, mut rows) in groups {
        rows.sort_unstable();
        for (expected, (order, id)) in rows.into_iter().enumerate() {
            if order != expected as i64 {
                return Err(GenerationError::inconsistent(
                    stage,
                    entity,
                    id,
                    format!("sort_order {order} breaks the sequence (expected {expected})"),
                ));
            }
        }
    }
    Ok(())
}

fn report(dataset: &Dataset, config: &SimulationConfig, calendar: &Calendar) -> DatasetReport {
    let tasks = &dataset.tasks;
    let completed = tasks.iter().filter(|t| t.is_complete()).count();
    let unassigned = tasks.iter().filter(|t| t.assignee_id.is_none()).count();
    let open_due = tasks
        .iter()
        .filter(|t| !t.is_complete() && t.due_date.is_some())
        .count();
    let overdue = tasks
        .iter()
        .filter(|t| calendar.is_overdue(t.due_date, t.completed_at))
        .count();

    let parent_of: HashMap<Uuid, Uuid> = dataset
        .subtasks
        .iter()
        .map(|s| (s.id, s.parent_task_id))
        .collect();
    let with_subtasks: HashSet<Uuid> = parent_of.values().copied().collect();
    let commented: HashSet<Uuid> = dataset
        .comments
        .iter()
        .filter_map(|c| match c.target {
            CommentTarget::Task(id) => Some(id),
            CommentTarget::Subtask(id) => parent_of.get(&id).copied(),
        })
        .collect();

    let complete_parent: HashMap<Uuid, bool> =
        tasks.iter().map(|t| (t.id, t.is_complete())).collect();
    let (mut closed, mut closed_done, mut open, mut open_done) = (0, 0, 0, 0);
    for s in &dataset.subtasks {
        let done = s.completed_at.is_some() as usize;
        if complete_parent.get(&s.parent_task_id).copied().unwrap_or(false) {
            closed += 1;
            closed_done += done;
        } else {
            open += 1;
            open_done += done;
        }
    }
    let when_complete = (closed > 0).then(|| ratio(closed_done, closed));
    let when_open = (open > 0).then(|| ratio(open_done, open));

    if let Some(rate) = when_complete {
        if rate < config.subtask.correlation_floor {
            warn!(
                "Only {:.1}% of subtasks under completed tasks are complete (floor {:.1}%)",
                rate * 100.0,
                config.subtask.correlation_floor * 100.0
            );
        }
    }

    let completed_fraction = ratio(completed, tasks.len());
    if !tasks.is_empty() && (completed_fraction - config.task.completion_ratio).abs() > 0.05 {
        warn!(
            "Task completion {:.1}% drifted from target {:.1}%",
            completed_fraction * 100.0,
            config.task.completion_ratio * 100.0
        );
    }

    DatasetReport {
        counts: dataset.counts(),
        completed_task_fraction: completed_fraction,
        unassigned_task_fraction: ratio(unassigned, tasks.len()),
        overdue_task_fraction: ratio(overdue, open_due),
        overdue_tasks: overdue,
        subtask_task_fraction: ratio(with_subtasks.len(), tasks.len()),
        commented_task_fraction: ratio(commented.len(), tasks.len()),
        subtask_completion_when_parent_complete: when_complete,
        subtask_completion_when_parent_open: when_open,
    }
}
