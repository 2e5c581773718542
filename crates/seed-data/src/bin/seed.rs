//! Generates the task-board dataset and writes it to SQLite.
//!
//! Run with:
//! ```
//! SIM_SEED=42 SIM_OUTPUT=output/task_board.sqlite cargo run -p seed-data --bin seed
//! ```
//!
//! `SIM_CONFIG` points at an optional JSON config; `SIM_NOW` pins the "now"
//! anchor (RFC 3339).

use board::Database;
use seed_data::builders::ScenarioBuilder;
use seed_data::config::SimulationConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SimulationConfig::from_env()?;
    let output = config.output.path.clone();

    let db = Database::create(&output).await?;
    db.apply_schema().await?;

    let result = ScenarioBuilder::from_config(config)
        .with_metrics(true)
        .build(&db)
        .await?;

    let counts = db.counts().await?;
    db.close().await;

    // Summary output
    tracing::info!("Seed completed: {}", output.display());
    tracing::info!("  Organizations: {}", counts.organizations);
    tracing::info!("  Teams: {}", counts.teams);
    tracing::info!("  Users: {}", counts.users);
    tracing::info!("  Memberships: {}", counts.memberships);
    tracing::info!("  Projects: {}", counts.projects);
    tracing::info!("  Sections: {}", counts.sections);
    tracing::info!("  Tasks: {}", counts.tasks);
    tracing::info!("  Subtasks: {}", counts.subtasks);
    tracing::info!("  Comments: {}", counts.comments);

    let report = &result.report;
    tracing::info!(
        "  Completed tasks: {:.1}%, overdue: {} ({:.1}% of open due-dated), commented: {:.1}%",
        report.completed_task_fraction * 100.0,
        report.overdue_tasks,
        report.overdue_task_fraction * 100.0,
        report.commented_task_fraction * 100.0
    );
    if let Some(metrics) = &result.metrics {
        tracing::info!(
            "  Generated in {}ms, seeded in {}ms",
            metrics.generation_time_ms,
            metrics.seeding_time_ms
        );
    }

    Ok(())
}
