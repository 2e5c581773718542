//! User generation with role, location and hiring history.

use std::collections::HashSet;

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::GeneratedOrganization;
use crate::config::SimulationConfig;
use crate::errors::GenerationError;
use crate::sampling::{chance, next_id};
use crate::temporal::Calendar;

/// Generated user data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedUser {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Job title; matches a role profile in the configuration.
    pub role: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    pub is_active: bool,
}

pub struct UserGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> UserGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    /// Generates the organization's headcount.
    pub fn generate(
        &self,
        organization: &GeneratedOrganization,
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedUser>, GenerationError> {
        let count = self.config.volume.users.sample(rng);
        let mut used_emails = HashSet::with_capacity(count);

        (0..count)
            .map(|_| self.generate_one(organization, &mut used_emails, rng))
            .collect()
    }

    fn generate_one(
        &self,
        organization: &GeneratedOrganization,
        used_emails: &mut HashSet<String>,
        rng: &mut impl Rng,
    ) -> Result<GeneratedUser, GenerationError> {
        let dist = &self.config.distributions;
        let people = &self.config.people;

        let first: String = FirstName().fake_with_rng(rng);
        let last: String = LastName().fake_with_rng(rng);
        let email = self.generate_email(&first, &last, used_emails);

        let role = dist.roles.draw("distributions.roles", rng)?.title.clone();
        let location = dist.locations.draw("distributions.locations", rng)?.clone();

        // Hiring is skewed toward the recent end of the window.
        let window_start = (self.calendar.now() - Duration::days(people.join_window_days))
            .max(organization.created_at);
        let joined_at = self
            .calendar
            .recent_between(window_start, self.calendar.now(), rng);

        Ok(GeneratedUser {
            id: next_id(rng),
            organization_id: organization.id,
            full_name: format!("{first} {last}"),
            email,
            role,
            location,
            joined_at,
            is_active: !chance(people.inactive_probability, rng),
        })
    }

    /// `first.last@domain`, with a numeric suffix when the address is taken.
    fn generate_email(&self, first: &str, last: &str, used: &mut HashSet<String>) -> String {
        let local = [first, last]
            .iter()
            .map(|part| normalize(part))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        let local = if local.is_empty() {
            "user".to_string()
        } else {
            local
        };
        let domain = &self.config.organization.domain;

        let mut email = format!("{local}@{domain}");
        let mut suffix = 1;
        while used.contains(&email) {
            email = format!("{local}{suffix}@{domain}");
            suffix += 1;
        }
        used.insert(email.clone());
        email
    }
}

fn normalize(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
