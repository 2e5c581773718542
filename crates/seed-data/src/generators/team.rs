//! Team generation.
//!
//! Teams are drawn without replacement from a weighted catalog so core
//! functions (Engineering, Product, Design, Sales) nearly always appear.

use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::GeneratedOrganization;
use crate::config::SimulationConfig;
use crate::errors::GenerationError;
use crate::sampling::{next_id, weighted_sample_unique};
use crate::temporal::Calendar;
use crate::text;

/// Generated team data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTeam {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Earliest team creation after the organization's founding.
const FIRST_TEAM_AFTER_ORG: Duration = Duration::days(182);
/// Latest team creation after the organization's founding.
const LAST_TEAM_AFTER_ORG: Duration = Duration::days(365 * 9);
/// Teams exist for at least this long before now.
const MIN_TEAM_AGE: Duration = Duration::days(90);

pub struct TeamGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> TeamGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn generate(
        &self,
        organization: &GeneratedOrganization,
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedTeam>, GenerationError> {
        let target = self.config.volume.teams.sample(rng);
        let catalog = self.config.distributions.teams.entries();
        let weights = catalog.iter().map(|e| e.weight).collect();
        let picked = weighted_sample_unique(weights, target, rng);

        if picked.len() < target {
            return Err(GenerationError::config(
                "distributions.teams",
                format!("only {} of {target} teams could be drawn", picked.len()),
            ));
        }

        let earliest = organization.created_at + FIRST_TEAM_AFTER_ORG;
        let latest = (organization.created_at + LAST_TEAM_AFTER_ORG)
            .min(self.calendar.now() - MIN_TEAM_AGE)
            .max(earliest);

        Ok(picked
            .into_iter()
            .map(|idx| GeneratedTeam {
                id: next_id(rng),
                organization_id: organization.id,
                name: catalog[idx].value.clone(),
                description: Some(text::team_description(rng)),
                created_at: self.calendar.uniform_between(earliest, latest, rng),
            })
            .collect())
    }
}
