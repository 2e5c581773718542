//! Comment thread generation.
//!
//! A share of tasks gets a short thread, either on the task itself or on one of
//! its subtasks. Threads are time-ordered between the target's creation and its
//! completion (or now), and push the owning task's last activity forward.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{
    GeneratedProject, GeneratedSubtask, GeneratedTask, GeneratedTeamMembership, members_by_team,
};
use crate::config::SimulationConfig;
use crate::errors::GenerationError;
use crate::pipeline::Stage;
use crate::sampling::{chance, next_id, sample_fraction};
use crate::temporal::Calendar;
use crate::text;

/// What a comment is attached to. Exactly one target per comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentTarget {
    Task(Uuid),
    Subtask(Uuid),
}

/// Generated comment data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedComment {
    pub id: Uuid,
    pub target: CommentTarget,
    pub author_id: Uuid,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl GeneratedComment {
    pub fn task_id(&self) -> Option<Uuid> {
        match self.target {
            CommentTarget::Task(id) => Some(id),
            CommentTarget::Subtask(_) => None,
        }
    }

    pub fn subtask_id(&self) -> Option<Uuid> {
        match self.target {
            CommentTarget::Subtask(id) => Some(id),
            CommentTarget::Task(_) => None,
        }
    }
}

/// Consecutive comments in a thread are at least this far apart.
const MIN_REPLY_GAP: Duration = Duration::SECOND;

pub struct CommentGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> CommentGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    /// Generates threads and raises `last_activity_at` on the commented tasks.
    pub fn generate(
        &self,
        tasks: &mut [GeneratedTask],
        subtasks: &[GeneratedSubtask],
        projects: &[GeneratedProject],
        memberships: &[GeneratedTeamMembership],
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedComment>, GenerationError> {
        let members = members_by_team(memberships);
        let team_of: HashMap<Uuid, Uuid> = projects.iter().map(|p| (p.id, p.team_id)).collect();

        let mut children: BTreeMap<Uuid, Vec<&GeneratedSubtask>> = BTreeMap::new();
        for subtask in subtasks {
            children.entry(subtask.parent_task_id).or_default().push(subtask);
        }

        let threads = sample_fraction(tasks.len(), self.config.volume.commented_task_fraction, rng);
        let mut comments = Vec::with_capacity(threads.len() * 3);

        for idx in threads {
            let task = &mut tasks[idx];
            let team = team_of.get(&task.project_id).copied().ok_or_else(|| {
                GenerationError::Referential {
                    stage: Stage::Comments,
                    entity: "task",
                    id: task.id,
                    target: "project",
                    missing: task.project_id,
                }
            })?;
            let team_members = members.get(&team).map_or(&[][..], Vec::as_slice);

            let on_subtask = match children.get(&task.id) {
                Some(kids) if chance(self.config.volume.subtask_comment_probability, rng) => {
                    kids.choose(rng).copied()
                }
                _ => None,
            };
            let (target, start, end) = match on_subtask {
                Some(s) => (
                    CommentTarget::Subtask(s.id),
                    s.created_at,
                    s.completed_at,
                ),
                None => (CommentTarget::Task(task.id), task.created_at, task.completed_at),
            };
            let done = end.is_some();
            let end = end.unwrap_or(self.calendar.now()).min(self.calendar.now());

            let count = self.config.volume.comments_per_task.sample_uniform(rng);
            let mut last: Option<OffsetDateTime> = None;

            for _ in 0..count {
                let floor = last.map_or(start, |t| t + MIN_REPLY_GAP);
                if floor > end {
                    break;
                }
                let created_at = self.calendar.recent_between(floor, end, rng);
                last = Some(created_at);

                comments.push(GeneratedComment {
                    id: next_id(rng),
                    target,
                    author_id: self.pick_author(task, team_members, rng),
                    body: text::comment_body(done, self.config.comment.snippet_probability, rng),
                    created_at,
                });
            }

            if let Some(last) = last {
                task.last_activity_at = task.last_activity_at.max(last);
            }
        }

        Ok(comments)
    }

    /// The assignee, else a teammate, else whoever created the task.
    fn pick_author(&self, task: &GeneratedTask, team_members: &[Uuid], rng: &mut impl Rng) -> Uuid {
        if let Some(assignee) = task.assignee_id {
            if chance(self.config.comment.author_is_assignee, rng) {
                return assignee;
            }
        }
        team_members
            .choose(rng)
            .copied()
            .unwrap_or(task.created_by_user_id)
    }
}
