//! Local SQLite storage.
//!
//! # Invariants
//! - Connections run with `foreign_keys=ON`, so deleting a goal removes its
//!   pillars and tasks.
//! - `(goal_id, position)` and `(pillar_id, position)` are unique.
//! - Applied schema version is mirrored to `PRAGMA user_version`.
//! - Queries run on the blocking pool; the connection is shared behind a mutex.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{GoalStore, StoreError, StoreResult};
use crate::grid::{Goal, Pillar, PillarDraft, Task, TaskDraft};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: "
        CREATE TABLE goals (
            id          TEXT PRIMARY KEY,
            goal_text   TEXT NOT NULL,
            is_public   INTEGER NOT NULL DEFAULT 0,
            share_token TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE pillars (
            id          TEXT PRIMARY KEY,
            goal_id     TEXT NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
            pillar_text TEXT NOT NULL,
            position    INTEGER NOT NULL CHECK (position BETWEEN 1 AND 8),
            created_at  TEXT NOT NULL,
            UNIQUE (goal_id, position)
        );

        CREATE TABLE tasks (
            id          TEXT PRIMARY KEY,
            pillar_id   TEXT NOT NULL REFERENCES pillars(id) ON DELETE CASCADE,
            task_text   TEXT NOT NULL,
            position    INTEGER NOT NULL CHECK (position BETWEEN 1 AND 8),
            created_at  TEXT NOT NULL,
            UNIQUE (pillar_id, position)
        );

        CREATE INDEX idx_goals_public ON goals(is_public, created_at DESC);
    ",
}];

const GOAL_COLUMNS: &str = "id, goal_text, is_public, share_token, created_at, updated_at";

/// SQLite-backed [`GoalStore`].
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unexpected(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        Self::bootstrap(Connection::open(path)?)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(conn: &Mutex<Connection>) -> StoreResult<MutexGuard<'_, Connection>> {
        conn.lock()
            .map_err(|_| StoreError::Unexpected("SQLite connection lock poisoned".to_string()))
    }

    /// Run `f` against the connection without blocking the async worker.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = Self::lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unexpected(format!("SQLite task failed: {}", e)))?
    }

    /// Number of stored goals. Blocks the calling thread.
    pub fn goal_count(&self) -> StoreResult<usize> {
        let conn = Self::lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM goals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn select_goal(conn: &Connection, column: &str, value: &str) -> StoreResult<Option<Goal>> {
        let sql = format!("SELECT {} FROM goals WHERE {} = ?1", GOAL_COLUMNS, column);
        Ok(conn.query_row(&sql, params![value], goal_from_row).optional()?)
    }
}

fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = MIGRATIONS.last().map_or(0, |m| m.version);

    if current > latest {
        return Err(StoreError::Unexpected(format!(
            "Database schema version {} is newer than supported {}",
            current, latest
        )));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    tracing::debug!("Applied SQLite migrations {} -> {}", current, latest);
    Ok(())
}

// Stored timestamps keep microseconds; truncate up front so rows read back equal.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(index: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
}

fn uuid_at(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(index)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(index, e))
}

fn time_at(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e))
}

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: uuid_at(row, 0)?,
        goal_text: row.get(1)?,
        is_public: row.get(2)?,
        share_token: row.get(3)?,
        created_at: time_at(row, 4)?,
        updated_at: time_at(row, 5)?,
    })
}

fn pillar_from_row(row: &Row<'_>) -> rusqlite::Result<Pillar> {
    Ok(Pillar {
        id: uuid_at(row, 0)?,
        goal_id: uuid_at(row, 1)?,
        pillar_text: row.get(2)?,
        position: row.get(3)?,
        created_at: time_at(row, 4)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: uuid_at(row, 0)?,
        pillar_id: uuid_at(row, 1)?,
        task_text: row.get(2)?,
        position: row.get(3)?,
        created_at: time_at(row, 4)?,
    })
}

#[async_trait]
impl GoalStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_goal(&self, goal_text: &str) -> StoreResult<Goal> {
        let now = now_micros();
        let goal = Goal {
            id: Uuid::new_v4(),
            goal_text: goal_text.to_string(),
            is_public: false,
            share_token: Uuid::new_v4().simple().to_string(),
            created_at: now,
            updated_at: now,
        };

        let row = goal.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO goals (id, goal_text, is_public, share_token, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id.to_string(),
                    row.goal_text,
                    row.is_public,
                    row.share_token,
                    timestamp(row.created_at),
                    timestamp(row.updated_at),
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(goal)
    }

    async fn insert_pillars(&self, goal_id: Uuid, pillars: &[PillarDraft]) -> StoreResult<Vec<Pillar>> {
        let now = now_micros();
        let rows: Vec<Pillar> = pillars
            .iter()
            .map(|p| Pillar {
                id: Uuid::new_v4(),
                goal_id,
                pillar_text: p.pillar_text.clone(),
                position: p.position,
                created_at: now,
            })
            .collect();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO pillars (id, goal_id, pillar_text, position, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for pillar in &rows {
                    stmt.execute(params![
                        pillar.id.to_string(),
                        pillar.goal_id.to_string(),
                        pillar.pillar_text,
                        pillar.position,
                        timestamp(pillar.created_at),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows)
        })
        .await
    }

    async fn insert_tasks(&self, pillar_id: Uuid, tasks: &[TaskDraft]) -> StoreResult<Vec<Task>> {
        let now = now_micros();
        let rows: Vec<Task> = tasks
            .iter()
            .map(|t| Task {
                id: Uuid::new_v4(),
                pillar_id,
                task_text: t.task_text.clone(),
                position: t.position,
                created_at: now,
            })
            .collect();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO tasks (id, pillar_id, task_text, position, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for task in &rows {
                    stmt.execute(params![
                        task.id.to_string(),
                        task.pillar_id.to_string(),
                        task.task_text,
                        task.position,
                        timestamp(task.created_at),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows)
        })
        .await
    }

    async fn goal_by_share_token(&self, share_token: &str) -> StoreResult<Option<Goal>> {
        let share_token = share_token.to_string();
        self.with_conn(move |conn| Self::select_goal(conn, "share_token", &share_token))
            .await
    }

    async fn pillars_for_goal(&self, goal_id: Uuid) -> StoreResult<Vec<Pillar>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, goal_id, pillar_text, position, created_at
                 FROM pillars WHERE goal_id = ?1 ORDER BY position",
            )?;
            let rows = stmt.query_map(params![goal_id.to_string()], pillar_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn tasks_for_pillar(&self, pillar_id: Uuid) -> StoreResult<Vec<Task>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, pillar_id, task_text, position, created_at
                 FROM tasks WHERE pillar_id = ?1 ORDER BY position",
            )?;
            let rows = stmt.query_map(params![pillar_id.to_string()], task_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn public_goals(&self, limit: usize) -> StoreResult<Vec<Goal>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM goals WHERE is_public = 1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                GOAL_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64], goal_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn set_public(&self, goal_id: Uuid, is_public: bool) -> StoreResult<Option<Goal>> {
        let id = goal_id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE goals SET is_public = ?1, updated_at = ?2 WHERE id = ?3",
                params![is_public, timestamp(now_micros()), id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Self::select_goal(conn, "id", &id)
        })
        .await
    }

    async fn delete_goal(&self, goal_id: Uuid) -> StoreResult<bool> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM goals WHERE id = ?1", params![goal_id.to_string()])?;
            Ok(deleted > 0)
        })
        .await
    }
}
