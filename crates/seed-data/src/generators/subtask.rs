//! Subtask generation.
//!
//! A per-run share of tasks gets an ordered checklist of subtasks. Subtask
//! state follows the parent: a finished parent almost always has finished
//! children, an open one only some.

use rand::Rng;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::task::CREATION_CUTOFF;
use super::{GeneratedOrganization, GeneratedTask};
use crate::config::SimulationConfig;
use crate::sampling::{chance, next_id, sample_fraction};
use crate::temporal::Calendar;
use crate::text;

/// Generated subtask data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSubtask {
    pub id: Uuid,
    pub parent_task_id: Uuid,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub assignee_id: Option<Uuid>,
    pub created_by_user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub sort_order: i64,
}

pub struct SubtaskGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> SubtaskGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn generate(
        &self,
        organization: &GeneratedOrganization,
        tasks: &[GeneratedTask],
        rng: &mut impl Rng,
    ) -> Vec<GeneratedSubtask> {
        let fraction = self.config.volume.subtask_task_fraction.sample(rng);
        let parents = sample_fraction(tasks.len(), fraction, rng);

        let mut subtasks = Vec::with_capacity(parents.len() * 4);
        for idx in parents {
            let parent = &tasks[idx];
            let count = self.config.volume.subtasks_per_task.sample_uniform(rng);
            for order in 0..count {
                subtasks.push(self.generate_one(organization, parent, order as i64, rng));
            }
        }

        subtasks
    }

    fn generate_one(
        &self,
        organization: &GeneratedOrganization,
        parent: &GeneratedTask,
        sort_order: i64,
        rng: &mut impl Rng,
    ) -> GeneratedSubtask {
        let cfg = &self.config.subtask;
        let now = self.calendar.now();

        let latest = parent
            .completed_at
            .unwrap_or(now)
            .min(now - CREATION_CUTOFF);
        let created_at = self.calendar.recent_between(parent.created_at, latest, rng);

        let due_date = match parent.due_date {
            Some(due) if chance(cfg.share_parent_due_probability, rng) => due,
            _ => self.calendar.due_from(created_at, cfg.own_due_days, rng),
        };

        let completion_probability = if parent.is_complete() {
            cfg.completion_when_parent_complete
        } else {
            cfg.completion_when_parent_open
        };
        let completed_at = if chance(completion_probability, rng) {
            self.calendar
                .completion_after(created_at, Some(due_date), cfg.completion_max_days, rng)
        } else {
            None
        };

        // Delegated items are sometimes left unassigned.
        let assignee_id = parent
            .assignee_id
            .filter(|_| !chance(cfg.unassign_probability, rng));

        GeneratedSubtask {
            id: next_id(rng),
            parent_task_id: parent.id,
            project_id: parent.project_id,
            organization_id: organization.id,
            name: text::subtask_title(&parent.name, rng),
            assignee_id,
            created_by_user_id: parent.assignee_id.unwrap_or(parent.created_by_user_id),
            created_at,
            due_date: Some(due_date),
            completed_at,
            sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::Priority;
    use std::collections::BTreeMap;
    use time::Duration;

    fn tasks(count: usize, rng: &mut impl Rng, calendar: &Calendar) -> Vec<GeneratedTask> {
        (0..count)
            .map(|i| {
                let created_at = calendar.now() - Duration::days(40 + (i % 30) as i64);
                let completed_at = (i % 2 == 0).then(|| created_at + Duration::days(3));
                GeneratedTask {
                    id: next_id(rng),
                    project_id: next_id(rng),
                    section_id: None,
                    organization_id: Uuid::nil(),
                    name: "Draft feature spec for billing".to_string(),
                    description: None,
                    assignee_id: (i % 3 != 0).then(|| next_id(rng)),
                    created_by_user_id: next_id(rng),
                    created_at,
                    due_date: Some(calendar.snap_forward(created_at.date() + Duration::days(10))),
                    completed_at,
                    last_activity_at: completed_at.unwrap_or(created_at),
                    priority: Priority::Medium,
                }
            })
            .collect()
    }

    fn organization() -> GeneratedOrganization {
        GeneratedOrganization {
            id: Uuid::nil(),
            name: "Acme".to_string(),
            domain: "acme.test".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_subtask_structure() {
        let config = crate::generators::fixtures::config();
        let calendar = crate::generators::fixtures::calendar(&config);
        let mut rng = crate::generators::fixtures::rng(30);
        let tasks = tasks(1_000, &mut rng, &calendar);

        let subtasks = SubtaskGenerator::new(&config, &calendar).generate(
            &organization(),
            &tasks,
            &mut rng,
        );

        let mut by_parent: BTreeMap<Uuid, Vec<&GeneratedSubtask>> = BTreeMap::new();
        for s in &subtasks {
            by_parent.entry(s.parent_task_id).or_default().push(s);
        }

        // Between 30% and 40% of tasks get subtasks.
        assert!((300..=400).contains(&by_parent.len()), "{}", by_parent.len());

        let parents: BTreeMap<_, _> = tasks.iter().map(|t| (t.id, t)).collect();
        for (parent_id, children) in &by_parent {
            let parent = parents[parent_id];
            assert!((2..=6).contains(&children.len()));
            let orders: Vec<_> = children.iter().map(|s| s.sort_order).collect();
            assert_eq!(orders, (0..children.len() as i64).collect::<Vec<_>>());

            for s in children {
                assert_eq!(s.project_id, parent.project_id);
                assert!(s.created_at >= parent.created_at);
                if let Some(done) = parent.completed_at {
                    assert!(s.created_at <= done);
                }
                if let Some(done) = s.completed_at {
                    assert!(done > s.created_at);
                    assert!(done <= calendar.now());
                }
                assert!(calendar.is_business_day(s.due_date.unwrap()));
                assert_eq!(
                    s.created_by_user_id,
                    parent.assignee_id.unwrap_or(parent.created_by_user_id)
                );
                if s.assignee_id.is_some() {
                    assert_eq!(s.assignee_id, parent.assignee_id);
                }
            }
        }
    }

    #[test]
    fn test_completion_follows_parent() {
        let config = crate::generators::fixtures::config();
        let calendar = crate::generators::fixtures::calendar(&config);
        let mut rng = crate::generators::fixtures::rng(31);
        let tasks = tasks(4_000, &mut rng, &calendar);

        let subtasks = SubtaskGenerator::new(&config, &calendar).generate(
            &organization(),
            &tasks,
            &mut rng,
        );
        let parents: BTreeMap<_, _> = tasks.iter().map(|t| (t.id, t)).collect();

        let (mut closed, mut closed_done, mut open, mut open_done) = (0, 0, 0, 0);
        for s in &subtasks {
            if parents[&s.parent_task_id].is_complete() {
                closed += 1;
                closed_done += s.completed_at.is_some() as usize;
            } else {
                open += 1;
                open_done += s.completed_at.is_some() as usize;
            }
        }

        let closed_rate = closed_done as f64 / closed as f64;
        let open_rate = open_done as f64 / open as f64;
        assert!(closed_rate >= config.subtask.correlation_floor, "{closed_rate}");
        assert!((open_rate - 0.3).abs() < 0.05, "{open_rate}");
    }
}
