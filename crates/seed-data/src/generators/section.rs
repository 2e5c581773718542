//! Workflow sections (board columns) per project.

use board::ProjectType;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::GeneratedProject;
use crate::config::SimulationConfig;
use crate::sampling::{chance, next_id};

/// Generated section data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSection {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub sort_order: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Workflow templates; the last column of each is terminal.
const TEMPLATES: &[&[&str]] = &[
    &["Backlog", "Next Up", "In Progress", "Review", "Done"],
    &["Todo", "Doing", "Blocked", "Ready for QA", "Done"],
    &["Ideas", "Prioritized", "Building", "Testing", "Launched"],
    &["Intake", "Triaged", "In Progress", "Validation", "Closed"],
    &["Pipeline", "Discovery", "Execution", "UAT", "Complete"],
];

/// Where a column sits in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Intake,
    InFlight,
    Terminal,
}

impl SectionKind {
    pub fn of(name: &str) -> Self {
        let name = name.to_lowercase();
        if ["backlog", "ideas", "intake"].iter().any(|k| name.contains(k)) {
            SectionKind::Intake
        } else if ["done", "closed", "complete", "launched"]
            .iter()
            .any(|k| name.contains(k))
        {
            SectionKind::Terminal
        } else {
            SectionKind::InFlight
        }
    }
}

pub struct SectionGenerator<'a> {
    config: &'a SimulationConfig,
}

impl<'a> SectionGenerator<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self { config }
    }

    pub fn generate(
        &self,
        projects: &[GeneratedProject],
        rng: &mut impl Rng,
    ) -> Vec<GeneratedSection> {
        let mut sections = Vec::with_capacity(projects.len() * 5);

        for project in projects {
            let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
            let mut names = template.to_vec();

            // Ops boards are sometimes leaner: drop one middle column.
            if project.project_type == ProjectType::Ops
                && names.len() > 4
                && chance(self.config.project.shortened_ops_workflow_probability, rng)
            {
                names.remove(rng.gen_range(1..names.len() - 1));
            }

            for (order, name) in names.into_iter().enumerate() {
                sections.push(GeneratedSection {
                    id: next_id(rng),
                    project_id: project.id,
                    name: name.to_string(),
                    sort_order: order as i64,
                    created_at: project.created_at,
                });
            }
        }

        sections
    }
}
