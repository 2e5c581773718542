use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{DatasetCounts, UserFootprint};

/// DDL for the nine relations, applied once to a fresh store.
pub const SCHEMA: &str = include_str!("../schema.sql");

/// Relations in dependency order (parents before children).
pub const TABLES: [&str; 9] = [
    "organizations",
    "teams",
    "users",
    "team_memberships",
    "projects",
    "sections",
    "tasks",
    "subtasks",
    "comments",
];

/// SQLite-backed schema store.
///
/// Every connection enforces foreign keys, and the pool holds a single
/// connection so the store only ever has one writer.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a fresh database file, replacing any previous output at `path`.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        for stale in [
            path.to_path_buf(),
            sidecar(path, "-journal"),
            sidecar(path, "-wal"),
            sidecar(path, "-shm"),
        ] {
            match tokio::fs::remove_file(&stale).await {
                Ok(()) => debug!("Removed previous output {}", stale.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(io_error(&stale, source)),
            }
        }

        info!("Creating database at {}", path.display());
        Self::connect(file_options(path).create_if_missing(true)).await
    }

    /// Opens an existing database file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::connect(file_options(path.as_ref()).create_if_missing(false)).await
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Creates all tables, constraints and indexes.
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("Applied schema ({} tables)", TABLES.len());
        Ok(())
    }

    /// Counts the rows of every relation.
    pub async fn counts(&self) -> Result<DatasetCounts, StoreError> {
        let mut counts = [0usize; 9];
        for (slot, table) in counts.iter_mut().zip(TABLES) {
            let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.pool)
                .await?;
            *slot = n as usize;
        }

        let [
            organizations,
            teams,
            users,
            memberships,
            projects,
            sections,
            tasks,
            subtasks,
            comments,
        ] = counts;

        Ok(DatasetCounts {
            organizations,
            teams,
            users,
            memberships,
            projects,
            sections,
            tasks,
            subtasks,
            comments,
        })
    }

    /// Removes a user from the organization.
    ///
    /// Memberships go with the user; task, subtask and comment references are
    /// set to NULL by the schema while the rows themselves stay.
    pub async fn remove_user(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts the rows that still reference a user.
    pub async fn user_footprint(&self, user_id: Uuid) -> Result<UserFootprint, StoreError> {
        let footprint = sqlx::query_as::<_, UserFootprint>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM team_memberships WHERE user_id = ?1) AS memberships,
                (SELECT COUNT(*) FROM tasks WHERE assignee_id = ?1) AS assigned_tasks,
                (SELECT COUNT(*) FROM tasks WHERE created_by_user_id = ?1) AS created_tasks,
                (SELECT COUNT(*) FROM subtasks WHERE assignee_id = ?1) AS assigned_subtasks,
                (SELECT COUNT(*) FROM subtasks WHERE created_by_user_id = ?1) AS created_subtasks,
                (SELECT COUNT(*) FROM comments WHERE author_id = ?1) AS authored_comments
            "#,
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(footprint)
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Flushes and closes the underlying connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn file_options(path: &Path) -> SqliteConnectOptions {
    // Rollback journal keeps the output a single self-contained file.
    SqliteConnectOptions::new()
        .filename(path)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Delete)
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        org: Uuid,
        user: Uuid,
        teammate: Uuid,
        task: Uuid,
        subtask: Uuid,
    }

    async fn seeded_store() -> (Database, Fixture) {
        let db = Database::in_memory().await.unwrap();
        db.apply_schema().await.unwrap();

        let fx = Fixture {
            org: Uuid::new_v4(),
            user: Uuid::new_v4(),
            teammate: Uuid::new_v4(),
            task: Uuid::new_v4(),
            subtask: Uuid::new_v4(),
        };
        let team = Uuid::new_v4();
        let project = Uuid::new_v4();
        let section = Uuid::new_v4();
        let ts = "2024-03-04 09:00:00.0 +00:00:00";

        let statements: Vec<(String, Vec<String>)> = vec![
            (
                "INSERT INTO organizations (id, name, domain, created_at) VALUES (?, 'Acme', 'acme.test', ?)".into(),
                vec![fx.org.to_string(), ts.into()],
            ),
            (
                "INSERT INTO teams (id, organization_id, name, created_at) VALUES (?, ?, 'Engineering', ?)".into(),
                vec![team.to_string(), fx.org.to_string(), ts.into()],
            ),
            (
                "INSERT INTO users (id, organization_id, full_name, email, role, location, joined_at, is_active) VALUES (?, ?, 'Ada Lovelace', 'ada@acme.test', 'Software Engineer', 'London', ?, 1)".into(),
                vec![fx.user.to_string(), fx.org.to_string(), ts.into()],
            ),
            (
                "INSERT INTO users (id, organization_id, full_name, email, role, location, joined_at, is_active) VALUES (?, ?, 'Alan Turing', 'alan@acme.test', 'Data Scientist', 'London', ?, 1)".into(),
                vec![fx.teammate.to_string(), fx.org.to_string(), ts.into()],
            ),
            (
                "INSERT INTO team_memberships (id, team_id, user_id, role, added_at) VALUES (?, ?, ?, 'member', ?)".into(),
                vec![Uuid::new_v4().to_string(), team.to_string(), fx.user.to_string(), ts.into()],
            ),
            (
                "INSERT INTO projects (id, team_id, organization_id, name, project_type, start_date, created_at) VALUES (?, ?, ?, 'Sprint 12', 'sprint', '2024-03-04', ?)".into(),
                vec![project.to_string(), team.to_string(), fx.org.to_string(), ts.into()],
            ),
            (
                "INSERT INTO sections (id, project_id, name, sort_order, created_at) VALUES (?, ?, 'Todo', 0, ?)".into(),
                vec![section.to_string(), project.to_string(), ts.into()],
            ),
            (
                "INSERT INTO tasks (id, project_id, section_id, organization_id, name, assignee_id, created_by_user_id, created_at, last_activity_at, priority) VALUES (?, ?, ?, ?, 'Draft spec', ?, ?, ?, ?, 'high')".into(),
                vec![
                    fx.task.to_string(),
                    project.to_string(),
                    section.to_string(),
                    fx.org.to_string(),
                    fx.user.to_string(),
                    fx.user.to_string(),
                    ts.into(),
                    ts.into(),
                ],
            ),
            (
                "INSERT INTO subtasks (id, parent_task_id, project_id, organization_id, name, assignee_id, created_by_user_id, created_at, sort_order) VALUES (?, ?, ?, ?, 'Review draft', ?, ?, ?, 0)".into(),
                vec![
                    fx.subtask.to_string(),
                    fx.task.to_string(),
                    project.to_string(),
                    fx.org.to_string(),
                    fx.user.to_string(),
                    fx.teammate.to_string(),
                    ts.into(),
                ],
            ),
            (
                "INSERT INTO comments (id, task_id, author_id, body, created_at) VALUES (?, ?, ?, 'On it', ?)".into(),
                vec![Uuid::new_v4().to_string(), fx.task.to_string(), fx.user.to_string(), ts.into()],
            ),
            (
                "INSERT INTO comments (id, subtask_id, author_id, body, created_at) VALUES (?, ?, ?, 'Done', ?)".into(),
                vec![Uuid::new_v4().to_string(), fx.subtask.to_string(), fx.user.to_string(), ts.into()],
            ),
        ];

        for (sql, binds) in statements {
            let mut query = sqlx::query(&sql);
            for value in binds {
                query = query.bind(value);
            }
            query.execute(db.pool()).await.unwrap();
        }

        (db, fx)
    }

    #[tokio::test]
    async fn test_schema_counts() {
        let (db, _) = seeded_store().await;
        let counts = db.counts().await.unwrap();

        assert_eq!(counts.organizations, 1);
        assert_eq!(counts.users, 2);
        assert_eq!(counts.tasks, 1);
        assert_eq!(counts.subtasks, 1);
        assert_eq!(counts.comments, 2);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::in_memory().await.unwrap();
        db.apply_schema().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO teams (id, organization_id, name, created_at) VALUES (?, ?, 'Orphan', '2024-01-01')",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(Uuid::new_v4().to_string())
        .execute(db.pool())
        .await;

        assert!(result.is_err(), "orphan team must be rejected");
    }

    #[tokio::test]
    async fn test_comment_requires_exactly_one_target() {
        let (db, fx) = seeded_store().await;

        let both = sqlx::query(
            "INSERT INTO comments (id, task_id, subtask_id, body, created_at) VALUES (?, ?, ?, 'x', '2024-01-01')",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(fx.task.to_string())
        .bind(fx.subtask.to_string())
        .execute(db.pool())
        .await;
        assert!(both.is_err());

        let neither = sqlx::query(
            "INSERT INTO comments (id, body, created_at) VALUES (?, 'x', '2024-01-01')",
        )
        .bind(Uuid::new_v4().to_string())
        .execute(db.pool())
        .await;
        assert!(neither.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (db, fx) = seeded_store().await;

        let result = sqlx::query(
            "INSERT INTO users (id, organization_id, full_name, email, role, location, joined_at, is_active) VALUES (?, ?, 'Copy', 'ada@acme.test', 'QA Engineer', 'Austin', '2024-01-01', 1)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(fx.org.to_string())
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove_user_nulls_references() {
        let (db, fx) = seeded_store().await;
        let before = db.counts().await.unwrap();

        assert!(!db.user_footprint(fx.user).await.unwrap().is_empty());
        assert!(db.remove_user(fx.user).await.unwrap());

        let footprint = db.user_footprint(fx.user).await.unwrap();
        assert!(footprint.is_empty(), "unexpected footprint {footprint:?}");

        let after = db.counts().await.unwrap();
        assert_eq!(after.users, before.users - 1);
        assert_eq!(after.memberships, before.memberships - 1);
        assert_eq!(after.tasks, before.tasks);
        assert_eq!(after.subtasks, before.subtasks);
        assert_eq!(after.comments, before.comments);

        // The teammate's creator reference on the subtask is untouched.
        assert_eq!(db.user_footprint(fx.teammate).await.unwrap().created_subtasks, 1);
    }

    #[tokio::test]
    async fn test_remove_organization_cascades() {
        let (db, fx) = seeded_store().await;

        sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(fx.org.to_string())
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.counts().await.unwrap(), DatasetCounts::default());
    }

    #[tokio::test]
    async fn test_create_replaces_previous_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("board.sqlite");

        let db = Database::create(&path).await.unwrap();
        db.apply_schema().await.unwrap();
        db.close().await;

        // A second run starts from an empty file, so the schema applies cleanly again.
        let db = Database::create(&path).await.unwrap();
        db.apply_schema().await.unwrap();
        assert_eq!(db.counts().await.unwrap(), DatasetCounts::default());
        db.close().await;

        let reopened = Database::open(&path).await.unwrap();
        assert_eq!(reopened.counts().await.unwrap().users, 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_user() {
        let (db, _) = seeded_store().await;
        assert!(!db.remove_user(Uuid::new_v4()).await.unwrap());
    }
}
