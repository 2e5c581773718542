//! Team membership generation.
//!
//! Each user joins one to three teams. Teams listed in the user's role profile
//! weigh `role_affinity_weight` times more than the rest, so engineers mostly
//! land in Engineering and account managers in Customer Success or Sales.

use std::collections::HashMap;

use board::MembershipRole;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{GeneratedTeam, GeneratedUser};
use crate::config::{RoleProfile, SimulationConfig};
use crate::errors::GenerationError;
use crate::pipeline::Stage;
use crate::sampling::{next_id, weighted_sample_unique};
use crate::temporal::Calendar;

/// Generated team membership data ready for database insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTeamMembership {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MembershipRole,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

pub struct MembershipGenerator<'a> {
    config: &'a SimulationConfig,
    calendar: &'a Calendar,
}

impl<'a> MembershipGenerator<'a> {
    pub fn new(config: &'a SimulationConfig, calendar: &'a Calendar) -> Self {
        Self { config, calendar }
    }

    pub fn generate(
        &self,
        teams: &[GeneratedTeam],
        users: &[GeneratedUser],
        rng: &mut impl Rng,
    ) -> Result<Vec<GeneratedTeamMembership>, GenerationError> {
        if teams.is_empty() {
            return Err(GenerationError::StageNotRun {
                stage: Stage::Memberships,
                requires: Stage::Teams,
            });
        }

        let dist = &self.config.distributions;
        let profiles: HashMap<&str, &RoleProfile> = dist
            .roles
            .entries()
            .iter()
            .map(|e| (e.value.title.as_str(), &e.value))
            .collect();

        let mut memberships = Vec::with_capacity(users.len() * 2);

        for user in users {
            let profile = profiles.get(user.role.as_str()).copied();
            let wanted = *dist
                .membership_counts
                .draw("distributions.membership_counts", rng)?;

            let weights = teams
                .iter()
                .map(|team| {
                    let preferred = profile.is_some_and(|p| p.teams.contains(&team.name));
                    if preferred {
                        self.config.people.role_affinity_weight
                    } else {
                        1.0
                    }
                })
                .collect();

            let roles = if profile.is_some_and(|p| p.manages) {
                &dist.manager_membership_roles
            } else {
                &dist.membership_roles
            };

            for idx in weighted_sample_unique(weights, wanted.min(teams.len()), rng) {
                let team = &teams[idx];
                let role = *roles.draw("distributions.membership_roles", rng)?;
                let earliest = user.joined_at.max(team.created_at);

                memberships.push(GeneratedTeamMembership {
                    id: next_id(rng),
                    team_id: team.id,
                    user_id: user.id,
                    role,
                    added_at: self
                        .calendar
                        .recent_between(earliest, self.calendar.now(), rng),
                });
            }
        }

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{OrganizationGenerator, TeamGenerator, UserGenerator, fixtures};
    use crate::sampling::CountRange;
    use std::collections::HashSet;

    #[test]
    fn test_memberships_respect_affinity_and_uniqueness() {
        let mut config = fixtures::config();
        config.volume.teams = CountRange::exactly(15);
        config.volume.users = CountRange::exactly(2_000);
        let calendar = fixtures::calendar(&config);
        let mut rng = fixtures::rng(8);

        let org = OrganizationGenerator::new(&config, &calendar).generate(&mut rng);
        let teams = TeamGenerator::new(&config, &calendar)
            .generate(&org, &mut rng)
            .unwrap();
        let users = UserGenerator::new(&config, &calendar)
            .generate(&org, &mut rng)
            .unwrap();
        let memberships = MembershipGenerator::new(&config, &calendar)
            .generate(&teams, &users, &mut rng)
            .unwrap();

        let pairs: HashSet<_> = memberships.iter().map(|m| (m.team_id, m.user_id)).collect();
        assert_eq!(pairs.len(), memberships.len());

        let per_user = memberships.iter().fold(HashMap::new(), |mut acc, m| {
            *acc.entry(m.user_id).or_insert(0usize) += 1;
            acc
        });
        assert_eq!(per_user.len(), users.len());
        assert!(per_user.values().all(|n| (1..=3).contains(n)));

        // Software engineers mostly sit in engineering-aligned teams.
        let team_names: HashMap<_, _> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
        let engineers: HashSet<_> = users
            .iter()
            .filter(|u| u.role == "Software Engineer")
            .map(|u| u.id)
            .collect();
        let engineer_memberships: Vec<_> = memberships
            .iter()
            .filter(|m| engineers.contains(&m.user_id))
            .collect();
        let aligned = engineer_memberships
            .iter()
            .filter(|m| ["Engineering", "Security", "IT"].contains(&team_names[&m.team_id]))
            .count();
        assert!(
            aligned * 2 > engineer_memberships.len(),
            "aligned {aligned} of {}",
            engineer_memberships.len()
        );

        let joined: HashMap<_, _> = users.iter().map(|u| (u.id, u.joined_at)).collect();
        let created: HashMap<_, _> = teams.iter().map(|t| (t.id, t.created_at)).collect();
        for m in &memberships {
            assert!(m.added_at >= joined[&m.user_id]);
            assert!(m.added_at >= created[&m.team_id]);
            assert!(m.added_at <= calendar.now());
        }
    }

    #[test]
    fn test_no_teams() {
        let config = fixtures::config();
        let calendar = fixtures::calendar(&config);
        let mut rng = fixtures::rng(9);

        let result = MembershipGenerator::new(&config, &calendar).generate(&[], &[], &mut rng);
        assert!(matches!(
            result,
            Err(GenerationError::StageNotRun {
                stage: Stage::Memberships,
                requires: Stage::Teams,
            })
        ));
    }
}
