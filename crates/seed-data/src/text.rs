//! Text templates for names, titles, descriptions and comment bodies.
//!
//! Titles are assembled from small phrase pools rather than lorem text so they
//! read like real work items; every draw comes from the caller's rng.

use board::{Priority, ProjectType};
use fake::Fake;
use fake::faker::company::en::{Bs, CatchPhrase};
use fake::faker::lorem::en::Sentence;
use rand::Rng;

const VERBS: &[&str] = &[
    "Review",
    "Implement",
    "Draft",
    "Refine",
    "Validate",
    "Align on",
    "Plan",
    "Sync on",
    "Estimate",
    "Document",
    "Prioritize",
    "Migrate",
    "Clean up",
    "Backfill",
];

const PRODUCT_OBJECTS: &[&str] = &[
    "API contract for {area}",
    "feature spec for {area}",
    "user journey for {area}",
    "acceptance criteria for {area}",
    "tracking plan for {area}",
];

const ENGINEERING_OBJECTS: &[&str] = &[
    "service dependency graph",
    "background job reliability",
    "database query performance",
    "error handling for edge cases",
    "deployment pipeline",
];

const GO_TO_MARKET_OBJECTS: &[&str] = &[
    "launch messaging",
    "sales enablement deck",
    "onboarding guide",
    "pricing one-pager",
    "FAQ document",
];

const OPS_OBJECTS: &[&str] = &[
    "runbook for {area} incidents",
    "alert thresholds for {area}",
    "playbook for {area} handoffs",
    "cleanup tasks for {area}",
];

const AREAS: &[&str] = &[
    "billing",
    "onboarding",
    "notifications",
    "workspace settings",
    "mobile experience",
    "reporting dashboards",
    "admin controls",
];

const SUBTASK_PREFIXES: &[&str] = &[
    "Draft",
    "Review",
    "Finalize",
    "Get sign-off on",
    "Update",
    "Double-check",
    "Clarify",
];

const OPEN_COMMENTS: &[&str] = &[
    "Let's sync on this before EOD.",
    "Pushing this to next sprint based on priorities.",
    "Blocked until we hear back from legal.",
    "Dropping a quick note here instead of email.",
    "Can we clarify the scope in the description?",
    "Flagging that this might impact reporting.",
    "Happy to pair on this if helpful.",
    "Moving this to In Progress now.",
];

const DONE_COMMENTS: &[&str] = &[
    "Looks good to me, thanks for the update.",
    "Verified in staging, closing this out.",
    "Shipped. Let's keep this aligned with the roadmap doc.",
    "Thanks all, great turnaround on this.",
    "Marking complete; follow-ups are tracked separately.",
];

const SPRINT_CODENAMES: &[&str] = &["Orion", "Nova", "Atlas", "Vega", "Helix", "Quasar"];
const LAUNCH_MARKETS: &[&str] = &["Enterprise", "SMB", "EMEA", "US", "APAC"];
const OPS_THEMES: &[&str] = &[
    "Reliability",
    "SRE",
    "Incident Readiness",
    "Data Hygiene",
    "Automation",
];

/// Intake columns whose tasks sometimes read as unconfirmed candidates.
const INTAKE_SECTIONS: &[&str] = &["backlog", "ideas"];

const CANDIDATE_PREFIX: &str = "Candidate: ";

fn pick<'a>(items: &[&'a str], rng: &mut impl Rng) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// Picks from the union of two pools without allocating.
fn pick_either<'a>(a: &[&'a str], b: &[&'a str], rng: &mut impl Rng) -> &'a str {
    let i = rng.gen_range(0..a.len() + b.len());
    if i < a.len() { a[i] } else { b[i - a.len()] }
}

/// Task title worded for the project type.
///
/// Roadmap and launch work leans toward specs and messaging, sprints toward
/// implementation, ops toward runbooks and cleanups.
pub fn task_title(
    project_type: ProjectType,
    section: Option<&str>,
    candidate_probability: f64,
    rng: &mut impl Rng,
) -> String {
    let verb = pick(VERBS, rng);
    let area = pick(AREAS, rng);

    let object = match project_type {
        ProjectType::Roadmap | ProjectType::Launch => {
            pick_either(PRODUCT_OBJECTS, GO_TO_MARKET_OBJECTS, rng)
        }
        ProjectType::Sprint => pick_either(ENGINEERING_OBJECTS, PRODUCT_OBJECTS, rng),
        ProjectType::Ops => pick(OPS_OBJECTS, rng),
    };

    let title = format!("{verb} {}", object.replace("{area}", area));

    let intake = section.is_some_and(|name| {
        INTAKE_SECTIONS
            .iter()
            .any(|s| name.eq_ignore_ascii_case(s))
    });
    if intake && rng.r#gen::<f64>() < candidate_probability {
        format!("{CANDIDATE_PREFIX}{title}")
    } else {
        title
    }
}

/// Short description whose urgency tracks the priority.
pub fn task_description(priority: Priority, rng: &mut impl Rng) -> String {
    let area = pick(AREAS, rng);
    let templates: &[&str] = match priority {
        Priority::Urgent => &[
            "Customer-facing issue in {area}; needs an owner today.",
            "Escalated by support. Impacting {area} for several accounts.",
            "Blocking the release train until {area} is stable again.",
        ],
        Priority::High => &[
            "Committed for this cycle. Dependencies on {area} are tracked below.",
            "Needed before the next milestone review of {area}.",
            "Leadership asked for an update on {area} by end of week.",
        ],
        Priority::Medium => &[
            "Scoped follow-up for {area}; details in the linked doc.",
            "Next step after the last round of feedback on {area}.",
            "Nice progress so far, remaining work on {area} listed below.",
        ],
        Priority::Low => &[
            "Parking this here so {area} improvements don't get lost.",
            "Low urgency cleanup around {area}, pick up when there is slack.",
            "Idea from the retro about {area}; revisit next quarter.",
        ],
    };
    pick(templates, rng).replace("{area}", area)
}

/// Subtask title built around the parent's focus.
pub fn subtask_title(parent_title: &str, rng: &mut impl Rng) -> String {
    let parent = parent_title
        .strip_prefix(CANDIDATE_PREFIX)
        .unwrap_or(parent_title);
    let focus = parent.rsplit(" for ").next().unwrap_or(parent);
    format!("{} {focus}", pick(SUBTASK_PREFIXES, rng))
}

/// Comment body; completed targets get wrap-up chatter.
pub fn comment_body(target_done: bool, snippet_probability: f64, rng: &mut impl Rng) -> String {
    if rng.r#gen::<f64>() < snippet_probability {
        let pool = if target_done { DONE_COMMENTS } else { OPEN_COMMENTS };
        pick(pool, rng).to_string()
    } else {
        Sentence(6..15).fake_with_rng(rng)
    }
}

/// Project name by type. Roadmaps reference the current or next year.
pub fn project_name(
    project_type: ProjectType,
    team_name: &str,
    year: i32,
    rng: &mut impl Rng,
) -> String {
    match project_type {
        ProjectType::Roadmap => {
            let quarter = rng.gen_range(1..=4);
            let year = year + rng.gen_range(0..=1);
            format!("{team_name} Q{quarter} {year} Roadmap")
        }
        ProjectType::Sprint => {
            let number = rng.gen_range(12..=58);
            format!("Sprint {number} - {}", pick(SPRINT_CODENAMES, rng))
        }
        ProjectType::Launch => {
            let feature: String = Bs().fake_with_rng(rng);
            format!(
                "{} Launch - {}",
                title_case(&feature),
                pick(LAUNCH_MARKETS, rng)
            )
        }
        ProjectType::Ops => format!("{team_name} {} Ops", pick(OPS_THEMES, rng)),
    }
}

pub fn project_description(rng: &mut impl Rng) -> String {
    Sentence(8..13).fake_with_rng(rng)
}

pub fn team_description(rng: &mut impl Rng) -> String {
    CatchPhrase().fake_with_rng(rng)
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
