//! Entity generators, one per pipeline stage.
//!
//! - [`OrganizationGenerator`]: the single root organization
//! - [`TeamGenerator`]: functional teams drawn from a weighted catalog
//! - [`UserGenerator`]: employees with weighted role and location
//! - [`MembershipGenerator`]: role-aligned team memberships
//! - [`ProjectGenerator`]: typed projects with lifecycle windows
//! - [`SectionGenerator`]: ordered workflow columns
//! - [`TaskGenerator`]: tasks with assignment, dates, priority and completion
//! - [`SubtaskGenerator`]: child items whose state follows the parent
//! - [`CommentGenerator`]: time-ordered comment threads
//!
//! Every generator borrows the run configuration and calendar, and draws only
//! from the rng it is handed.

pub mod comment;
pub mod membership;
pub mod organization;
pub mod project;
pub mod section;
pub mod subtask;
pub mod task;
pub mod team;
pub mod user;

pub use comment::{CommentGenerator, CommentTarget, GeneratedComment};
pub use membership::{GeneratedTeamMembership, MembershipGenerator};
pub use organization::{GeneratedOrganization, OrganizationGenerator};
pub use project::{GeneratedProject, ProjectGenerator};
pub use section::{GeneratedSection, SectionGenerator, SectionKind};
pub use subtask::{GeneratedSubtask, SubtaskGenerator};
pub use task::{GeneratedTask, TaskGenerator};
pub use team::{GeneratedTeam, TeamGenerator};
pub use user::{GeneratedUser, UserGenerator};

use std::collections::BTreeMap;

use uuid::Uuid;

/// Team id to member user ids, in membership order.
pub(crate) fn members_by_team(
    memberships: &[GeneratedTeamMembership],
) -> BTreeMap<Uuid, Vec<Uuid>> {
    let mut members: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
    for m in memberships {
        members.entry(m.team_id).or_default().push(m.user_id);
    }
    members
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built inputs for generator unit tests.

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::datetime;

    use crate::config::SimulationConfig;
    use crate::temporal::Calendar;

    pub fn config() -> SimulationConfig {
        SimulationConfig {
            now: Some(datetime!(2025-06-04 12:00 UTC)),
            ..SimulationConfig::default()
        }
    }

    pub fn calendar(config: &SimulationConfig) -> Calendar {
        Calendar::new(config.now, &config.calendar).unwrap()
    }

    pub fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }
}
