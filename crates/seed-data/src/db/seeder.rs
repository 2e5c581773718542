//! Database seeding utilities.

use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::generators::{
    GeneratedComment, GeneratedOrganization, GeneratedProject, GeneratedSection, GeneratedSubtask,
    GeneratedTask, GeneratedTeam, GeneratedTeamMembership, GeneratedUser,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to insert {table} row {id}: {source}")]
    Insert {
        table: &'static str,
        id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error("Dataset has no organization")]
    NoOrganization,
}

fn insert_error(table: &'static str, id: Uuid) -> impl FnOnce(sqlx::Error) -> SeedError {
    move |source| SeedError::Insert { table, id, source }
}

fn id_text(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

/// Writes a validated [`Dataset`] into an empty store.
///
/// All nine relations go in as one transaction, parents before children, so
/// a failed write leaves the store untouched.
pub struct Seeder {
    pool: SqlitePool,
    batch_size: usize,
}

impl Seeder {
    /// Creates a new seeder with the given database pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: 500,
        }
    }

    /// Sets how many rows are written between progress reports.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Inserts every record of `dataset`.
    pub async fn seed(&self, dataset: &Dataset) -> Result<(), SeedError> {
        let organization = dataset
            .organization
            .as_ref()
            .ok_or(SeedError::NoOrganization)?;

        let mut tx = self.pool.begin().await?;

        self.seed_organization(&mut tx, organization).await?;
        self.seed_teams(&mut tx, &dataset.teams).await?;
        self.seed_users(&mut tx, &dataset.users).await?;
        self.seed_team_memberships(&mut tx, &dataset.memberships)
            .await?;
        self.seed_projects(&mut tx, &dataset.projects).await?;
        self.seed_sections(&mut tx, &dataset.sections).await?;
        self.seed_tasks(&mut tx, &dataset.tasks).await?;
        self.seed_subtasks(&mut tx, &dataset.subtasks).await?;
        self.seed_comments(&mut tx, &dataset.comments).await?;

        tx.commit().await?;
        info!("Committed {} records", dataset.counts().total());
        Ok(())
    }

    fn progress(&self, table: &str, done: usize, total: usize) {
        if done % self.batch_size == 0 || done == total {
            debug!("  Seeded {}/{} {}", done, total, table);
        }
    }

    async fn seed_organization(
        &self,
        conn: &mut SqliteConnection,
        org: &GeneratedOrganization,
    ) -> Result<(), SeedError> {
        sqlx::query("INSERT INTO organizations (id, name, domain, created_at) VALUES (?, ?, ?, ?)")
            .bind(org.id.to_string())
            .bind(&org.name)
            .bind(&org.domain)
            .bind(org.created_at)
            .execute(conn)
            .await
            .map_err(insert_error("organizations", org.id))?;

        info!("Seeded organization {}", org.name);
        Ok(())
    }

    async fn seed_teams(
        &self,
        conn: &mut SqliteConnection,
        teams: &[GeneratedTeam],
    ) -> Result<(), SeedError> {
        info!("Seeding {} teams...", teams.len());

        for (i, team) in teams.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO teams (id, organization_id, name, description, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(team.id.to_string())
            .bind(team.organization_id.to_string())
            .bind(&team.name)
            .bind(&team.description)
            .bind(team.created_at)
            .execute(&mut *conn)
            .await
            .map_err(insert_error("teams", team.id))?;
            self.progress("teams", i + 1, teams.len());
        }

        info!("Seeded {} teams", teams.len());
        Ok(())
    }

    async fn seed_users(
        &self,
        conn: &mut SqliteConnection,
        users: &[GeneratedUser],
    ) -> Result<(), SeedError> {
        info!("Seeding {} users...", users.len());

        for (i, user) in users.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO users (id, organization_id, full_name, email, role, location, joined_at, is_active)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.id.to_string())
            .bind(user.organization_id.to_string())
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.role)
            .bind(&user.location)
            .bind(user.joined_at)
            .bind(i64::from(user.is_active))
            .execute(&mut *conn)
            .await
            .map_err(insert_error("users", user.id))?;
            self.progress("users", i + 1, users.len());
        }

        info!("Seeded {} users", users.len());
        Ok(())
    }

    async fn seed_team_memberships(
        &self,
        conn: &mut SqliteConnection,
        memberships: &[GeneratedTeamMembership],
    ) -> Result<(), SeedError> {
        info!("Seeding {} team memberships...", memberships.len());

        for (i, membership) in memberships.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO team_memberships (id, team_id, user_id, role, added_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(membership.id.to_string())
            .bind(membership.team_id.to_string())
            .bind(membership.user_id.to_string())
            .bind(membership.role.as_str())
            .bind(membership.added_at)
            .execute(&mut *conn)
            .await
            .map_err(insert_error("team_memberships", membership.id))?;
            self.progress("team memberships", i + 1, memberships.len());
        }

        info!("Seeded {} team memberships", memberships.len());
        Ok(())
    }

    async fn seed_projects(
        &self,
        conn: &mut SqliteConnection,
        projects: &[GeneratedProject],
    ) -> Result<(), SeedError> {
        info!("Seeding {} projects...", projects.len());

        for (i, project) in projects.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO projects (id, team_id, organization_id, name, description, project_type,
                                      start_date, due_date, created_at, completed_at, is_archived)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(project.id.to_string())
            .bind(project.team_id.to_string())
            .bind(project.organization_id.to_string())
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.project_type.as_str())
            .bind(project.start_date)
            .bind(project.due_date)
            .bind(project.created_at)
            .bind(project.completed_at)
            .bind(i64::from(project.is_archived))
            .execute(&mut *conn)
            .await
            .map_err(insert_error("projects", project.id))?;
            self.progress("projects", i + 1, projects.len());
        }

        info!("Seeded {} projects", projects.len());
        Ok(())
    }

    async fn seed_sections(
        &self,
        conn: &mut SqliteConnection,
        sections: &[GeneratedSection],
    ) -> Result<(), SeedError> {
        info!("Seeding {} sections...", sections.len());

        for (i, section) in sections.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sections (id, project_id, name, sort_order, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(section.id.to_string())
            .bind(section.project_id.to_string())
            .bind(&section.name)
            .bind(section.sort_order)
            .bind(section.created_at)
            .execute(&mut *conn)
            .await
            .map_err(insert_error("sections", section.id))?;
            self.progress("sections", i + 1, sections.len());
        }

        info!("Seeded {} sections", sections.len());
        Ok(())
    }

    async fn seed_tasks(
        &self,
        conn: &mut SqliteConnection,
        tasks: &[GeneratedTask],
    ) -> Result<(), SeedError> {
        info!("Seeding {} tasks...", tasks.len());

        for (i, task) in tasks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tasks (id, project_id, section_id, organization_id, name, description,
                                   assignee_id, created_by_user_id, created_at, due_date,
                                   completed_at, last_activity_at, priority)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(task.id.to_string())
            .bind(task.project_id.to_string())
            .bind(id_text(task.section_id))
            .bind(task.organization_id.to_string())
            .bind(&task.name)
            .bind(&task.description)
            .bind(id_text(task.assignee_id))
            .bind(task.created_by_user_id.to_string())
            .bind(task.created_at)
            .bind(task.due_date)
            .bind(task.completed_at)
            .bind(task.last_activity_at)
            .bind(task.priority.as_str())
            .execute(&mut *conn)
            .await
            .map_err(insert_error("tasks", task.id))?;
            self.progress("tasks", i + 1, tasks.len());
        }

        info!("Seeded {} tasks", tasks.len());
        Ok(())
    }

    async fn seed_subtasks(
        &self,
        conn: &mut SqliteConnection,
        subtasks: &[GeneratedSubtask],
    ) -> Result<(), SeedError> {
        info!("Seeding {} subtasks...", subtasks.len());

        for (i, subtask) in subtasks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO subtasks (id, parent_task_id, project_id, organization_id, name,
                                      assignee_id, created_by_user_id, created_at, due_date,
                                      completed_at, sort_order)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(subtask.id.to_string())
            .bind(subtask.parent_task_id.to_string())
            .bind(subtask.project_id.to_string())
            .bind(subtask.organization_id.to_string())
            .bind(&subtask.name)
            .bind(id_text(subtask.assignee_id))
            .bind(subtask.created_by_user_id.to_string())
            .bind(subtask.created_at)
            .bind(subtask.due_date)
            .bind(subtask.completed_at)
            .bind(subtask.sort_order)
            .execute(&mut *conn)
            .await
            .map_err(insert_error("subtasks", subtask.id))?;
            self.progress("subtasks", i + 1, subtasks.len());
        }

        info!("Seeded {} subtasks", subtasks.len());
        Ok(())
    }

    async fn seed_comments(
        &self,
        conn: &mut SqliteConnection,
        comments: &[GeneratedComment],
    ) -> Result<(), SeedError> {
        info!("Seeding {} comments...", comments.len());

        for (i, comment) in comments.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO comments (id, task_id, subtask_id, author_id, body, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(comment.id.to_string())
            .bind(id_text(comment.task_id()))
            .bind(id_text(comment.subtask_id()))
            .bind(comment.author_id.to_string())
            .bind(&comment.body)
            .bind(comment.created_at)
            .execute(&mut *conn)
            .await
            .map_err(insert_error("comments", comment.id))?;
            self.progress("comments", i + 1, comments.len());
        }

        info!("Seeded {} comments", comments.len());
        Ok(())
    }

    /// Deletes every seeded row, children first.
    pub async fn clear_all(&self) -> Result<(), SeedError> {
        info!("Clearing all seeded data...");

        let mut tx = self.pool.begin().await?;
        for table in board::database::TABLES.iter().rev() {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("All data cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board::Database;

    use crate::generators::{CommentTarget, fixtures};
    use crate::pipeline::Orchestrator;
    use crate::sampling::CountRange;

    fn small_dataset() -> Dataset {
        let mut config = fixtures::config();
        config.volume.teams = CountRange::exactly(8);
        config.volume.users = CountRange::exactly(60);
        config.volume.projects_per_team = CountRange::exactly(1);
        config.volume.tasks_per_project = CountRange::exactly(30);
        Orchestrator::new(&config).unwrap().run().unwrap().dataset
    }

    async fn store() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.apply_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_seed_writes_every_record() {
        let dataset = small_dataset();
        let db = store().await;

        Seeder::new(db.pool().clone())
            .with_batch_size(7)
            .seed(&dataset)
            .await
            .unwrap();

        assert_eq!(db.counts().await.unwrap(), dataset.counts());
    }

    #[tokio::test]
    async fn test_comment_targets_stored_in_one_column() {
        let dataset = small_dataset();
        let db = store().await;
        Seeder::new(db.pool().clone()).seed(&dataset).await.unwrap();

        let on_subtasks: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE subtask_id IS NOT NULL")
                .fetch_one(db.pool())
                .await
                .unwrap();
        let expected = dataset
            .comments
            .iter()
            .filter(|c| matches!(c.target, CommentTarget::Subtask(_)))
            .count();
        assert_eq!(on_subtasks as usize, expected);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let mut dataset = small_dataset();
        // Two tasks with one id violate the primary key late in the transaction.
        let dup = dataset.tasks[0].clone();
        dataset.tasks.push(dup);
        let db = store().await;

        let result = Seeder::new(db.pool().clone()).seed(&dataset).await;
        match result {
            Err(SeedError::Insert { table, id, .. }) => {
                assert_eq!(table, "tasks");
                assert_eq!(id, dataset.tasks[0].id);
            }
            other => panic!("expected insert error, got {other:?}"),
        }
        assert_eq!(db.counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_stored_timestamps_keep_order() {
        let dataset = small_dataset();
        let db = store().await;
        Seeder::new(db.pool().clone()).seed(&dataset).await.unwrap();

        let task = &dataset.tasks[0];
        let (created, activity): (time::OffsetDateTime, time::OffsetDateTime) = sqlx::query_as(
            "SELECT created_at, last_activity_at FROM tasks WHERE id = ?",
        )
        .bind(task.id.to_string())
        .fetch_one(db.pool())
        .await
        .unwrap();

        assert_eq!(created, task.created_at);
        assert!(activity >= created);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let dataset = small_dataset();
        let db = store().await;
        let seeder = Seeder::new(db.pool().clone());

        seeder.seed(&dataset).await.unwrap();
        seeder.clear_all().await.unwrap();
        assert_eq!(db.counts().await.unwrap().total(), 0);

        seeder.seed(&dataset).await.unwrap();
        assert_eq!(db.counts().await.unwrap(), dataset.counts());
    }
}
