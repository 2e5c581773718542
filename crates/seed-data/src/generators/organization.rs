//! Organization generation.

use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::sampling::next_id;
use crate::temporal::Calendar;

/// Generated organization data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedOrganization {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub struct OrganizationGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> OrganizationGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    /// Generates the organization, founded a whole number of years before now.
    pub fn generate(&self, rng: &mut impl Rng) -> GeneratedOrganization {
        let years = self.config.organization.age_years.sample_uniform(rng) as i64;

        GeneratedOrganization {
            id: next_id(rng),
            name: self.config.organization.name.clone(),
            domain: self.config.organization.domain.clone(),
            created_at: self.calendar.now() - Duration::days(365 * years),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fixtures;

    #[test]
    fn test_founded_eight_to_fifteen_years_ago() {
        let config = fixtures::config();
        let calendar = fixtures::calendar(&config);
        let generator = OrganizationGenerator::new(&config, &calendar);
        let mut rng = fixtures::rng(1);

        for _ in 0..50 {
            let org = generator.generate(&mut rng);
            let age = (calendar.now() - org.created_at).whole_days();
            assert!((365 * 8..=365 * 15).contains(&age), "age: {age}");
            assert_eq!(org.name, "Acme Global Solutions");
            assert_eq!(org.domain, "acme-corp.com");
        }
    }
}
