//! Grid persistence.
//!
//! [`GoalStore`] is the row-level interface (goals, pillars, tasks). Two
//! backends implement it: Supabase PostgREST and a local SQLite file. The
//! free functions here compose those calls into whole-grid operations.
//!
//! A grid is written as 1 goal + 8 pillars + 64 tasks. If any insert after the
//! goal fails, [`persist_grid`] deletes the goal again (pillars and tasks go
//! with it through the cascade) so no partial grid stays behind.

mod sqlite;
mod supabase;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::grid::{
    validate_shape, GenerationError, Goal, GridDraft, HaradaGrid, Pillar, PillarDraft,
    PillarWithTasks, Task, TaskDraft,
};

/// Default number of grids in the public gallery.
pub const DEFAULT_GALLERY_LIMIT: usize = 6;

/// Upper bound for gallery requests.
pub const MAX_GALLERY_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{operation} failed: {status} - {body}")]
    Http {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unexpected result: {0}")]
    Unexpected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row-level storage for goals, pillars and tasks.
#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Insert a private goal and mint its share token.
    async fn insert_goal(&self, goal_text: &str) -> StoreResult<Goal>;

    /// Insert pillars for a goal, keeping their positions.
    async fn insert_pillars(&self, goal_id: Uuid, pillars: &[PillarDraft]) -> StoreResult<Vec<Pillar>>;

    /// Insert tasks for a pillar, keeping their positions.
    async fn insert_tasks(&self, pillar_id: Uuid, tasks: &[TaskDraft]) -> StoreResult<Vec<Task>>;

    async fn goal_by_share_token(&self, share_token: &str) -> StoreResult<Option<Goal>>;

    /// Pillars of a goal ordered by position.
    async fn pillars_for_goal(&self, goal_id: Uuid) -> StoreResult<Vec<Pillar>>;

    /// Tasks of a pillar ordered by position.
    async fn tasks_for_pillar(&self, pillar_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Public goals, newest first.
    async fn public_goals(&self, limit: usize) -> StoreResult<Vec<Goal>>;

    /// Change visibility. Returns `None` if the goal does not exist.
    async fn set_public(&self, goal_id: Uuid, is_public: bool) -> StoreResult<Option<Goal>>;

    /// Delete a goal with its pillars and tasks. Returns whether it existed.
    async fn delete_goal(&self, goal_id: Uuid) -> StoreResult<bool>;
}

pub type SharedStore = Arc<dyn GoalStore>;

/// Open the store selected by the configuration.
pub fn from_config(storage: &StorageConfig) -> StoreResult<SharedStore> {
    match storage {
        StorageConfig::Supabase {
            url,
            service_role_key,
        } => {
            tracing::info!("Using Supabase storage at {}", url);
            Ok(Arc::new(SupabaseStore::new(url, service_role_key)))
        }
        StorageConfig::Sqlite { path } => {
            tracing::info!("Using SQLite storage at {}", path.display());
            Ok(Arc::new(SqliteStore::open(path)?))
        }
    }
}

/// Persist a validated draft as a new private goal.
pub async fn persist_grid(
    store: &dyn GoalStore,
    goal_text: &str,
    draft: &GridDraft,
) -> Result<HaradaGrid, GenerationError> {
    validate_shape(draft)?;

    let goal = store.insert_goal(goal_text).await?;

    match write_pillars(store, &goal, draft).await {
        Ok(pillars) => {
            tracing::info!(
                "Persisted grid {} (share token {})",
                goal.id,
                goal.share_token
            );
            Ok(HaradaGrid { goal, pillars })
        }
        Err(e) => {
            tracing::error!("Failed to persist grid {}, rolling back: {}", goal.id, e);
            if let Err(cleanup) = store.delete_goal(goal.id).await {
                tracing::error!("Failed to remove partial grid {}: {}", goal.id, cleanup);
            }
            Err(e.into())
        }
    }
}

async fn write_pillars(
    store: &dyn GoalStore,
    goal: &Goal,
    draft: &GridDraft,
) -> StoreResult<Vec<PillarWithTasks>> {
    let mut pillars = store.insert_pillars(goal.id, &draft.pillars).await?;
    pillars.sort_by_key(|p| p.position);

    if pillars.len() != draft.pillars.len() {
        return Err(StoreError::Unexpected(format!(
            "Inserted {} pillars, expected {}",
            pillars.len(),
            draft.pillars.len()
        )));
    }

    let mut out = Vec::with_capacity(pillars.len());
    for (pillar, pillar_draft) in pillars.into_iter().zip(&draft.pillars) {
        let mut tasks = store.insert_tasks(pillar.id, &pillar_draft.tasks).await?;
        tasks.sort_by_key(|t| t.position);
        out.push(PillarWithTasks { pillar, tasks });
    }
    Ok(out)
}

/// Join a goal with its pillars and tasks.
pub async fn load_tree(store: &dyn GoalStore, goal: Goal) -> StoreResult<HaradaGrid> {
    let pillars = store.pillars_for_goal(goal.id).await?;
    let pillars = futures::future::try_join_all(pillars.into_iter().map(|pillar| async move {
        let tasks = store.tasks_for_pillar(pillar.id).await?;
        Ok::<_, StoreError>(PillarWithTasks { pillar, tasks })
    }))
    .await?;

    let mut grid = HaradaGrid { goal, pillars };
    grid.sort_by_position();
    Ok(grid)
}

/// Load the grid behind a share token.
pub async fn load_grid(store: &dyn GoalStore, share_token: &str) -> StoreResult<Option<HaradaGrid>> {
    match store.goal_by_share_token(share_token).await? {
        Some(goal) => Ok(Some(load_tree(store, goal).await?)),
        None => Ok(None),
    }
}

/// Public grids for the gallery, newest first.
pub async fn load_public_grids(store: &dyn GoalStore, limit: usize) -> StoreResult<Vec<HaradaGrid>> {
    let limit = limit.clamp(1, MAX_GALLERY_LIMIT);
    let goals = store.public_goals(limit).await?;
    futures::future::try_join_all(goals.into_iter().map(|goal| load_tree(store, goal))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{assemble, templates::GENERIC};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Delegates to SQLite but fails the nth `insert_tasks` call (1-based).
    struct FailingTasksStore {
        inner: SqliteStore,
        fail_on: usize,
        task_calls: AtomicUsize,
        pillar_ids: Mutex<Vec<Uuid>>,
    }

    impl FailingTasksStore {
        fn new(fail_on: usize) -> Self {
            Self {
                inner: SqliteStore::open_in_memory().unwrap(),
                fail_on,
                task_calls: AtomicUsize::new(0),
                pillar_ids: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GoalStore for FailingTasksStore {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn insert_goal(&self, goal_text: &str) -> StoreResult<Goal> {
            self.inner.insert_goal(goal_text).await
        }

        async fn insert_pillars(&self, goal_id: Uuid, pillars: &[PillarDraft]) -> StoreResult<Vec<Pillar>> {
            self.inner.insert_pillars(goal_id, pillars).await
        }

        async fn insert_tasks(&self, pillar_id: Uuid, tasks: &[TaskDraft]) -> StoreResult<Vec<Task>> {
            self.pillar_ids.lock().unwrap().push(pillar_id);
            let call = self.task_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(StoreError::Unexpected("tasks insert failed".to_string()));
            }
            self.inner.insert_tasks(pillar_id, tasks).await
        }

        async fn goal_by_share_token(&self, share_token: &str) -> StoreResult<Option<Goal>> {
            self.inner.goal_by_share_token(share_token).await
        }

        async fn pillars_for_goal(&self, goal_id: Uuid) -> StoreResult<Vec<Pillar>> {
            self.inner.pillars_for_goal(goal_id).await
        }

        async fn tasks_for_pillar(&self, pillar_id: Uuid) -> StoreResult<Vec<Task>> {
            self.inner.tasks_for_pillar(pillar_id).await
        }

        async fn public_goals(&self, limit: usize) -> StoreResult<Vec<Goal>> {
            self.inner.public_goals(limit).await
        }

        async fn set_public(&self, goal_id: Uuid, is_public: bool) -> StoreResult<Option<Goal>> {
            self.inner.set_public(goal_id, is_public).await
        }

        async fn delete_goal(&self, goal_id: Uuid) -> StoreResult<bool> {
            self.inner.delete_goal(goal_id).await
        }
    }

    #[tokio::test]
    async fn test_persist_rolls_back_mid_sequence_failure() {
        let store = FailingTasksStore::new(4);
        let draft = assemble(&GENERIC).unwrap();

        let err = persist_grid(&store, "Learn to paint", &draft).await.unwrap_err();
        assert!(matches!(err, GenerationError::Store(StoreError::Unexpected(_))));
        assert!(!err.is_validation());
        assert_eq!(store.task_calls.load(Ordering::SeqCst), 4);

        // Goal, pillars and the three task batches already written are gone.
        assert_eq!(store.inner.goal_count().unwrap(), 0);
        let pillar_ids = store.pillar_ids.lock().unwrap().clone();
        assert_eq!(pillar_ids.len(), 4);
        for pillar_id in pillar_ids {
            assert!(store.inner.tasks_for_pillar(pillar_id).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_persist_rejects_bad_shape_before_writing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut draft = assemble(&GENERIC).unwrap();
        draft.pillars.truncate(6);

        let err = persist_grid(&store, "Learn to paint", &draft).await.unwrap_err();
        assert!(matches!(err, GenerationError::ShapeViolation(_)));
        assert_eq!(store.goal_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let draft = assemble(&GENERIC).unwrap();

        let saved = persist_grid(&store, "Learn to paint", &draft).await.unwrap();
        assert!(saved.is_complete());
        assert!(!saved.goal.is_public);

        let loaded = load_grid(&store, &saved.goal.share_token).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        for (pillar, pillar_draft) in loaded.pillars.iter().zip(&draft.pillars) {
            assert_eq!(pillar.pillar.pillar_text, pillar_draft.pillar_text);
            assert_eq!(pillar.pillar.position, pillar_draft.position);
            let texts: Vec<&str> = pillar.tasks.iter().map(|t| t.task_text.as_str()).collect();
            let expected: Vec<&str> = pillar_draft.tasks.iter().map(|t| t.task_text.as_str()).collect();
            assert_eq!(texts, expected);
        }

        assert!(load_grid(&store, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_public_gallery() {
        let store = SqliteStore::open_in_memory().unwrap();
        let draft = assemble(&GENERIC).unwrap();

        let first = persist_grid(&store, "First", &draft).await.unwrap();
        let _private = persist_grid(&store, "Private", &draft).await.unwrap();
        let third = persist_grid(&store, "Third", &draft).await.unwrap();

        store.set_public(first.goal.id, true).await.unwrap();
        store.set_public(third.goal.id, true).await.unwrap();

        let gallery = load_public_grids(&store, DEFAULT_GALLERY_LIMIT).await.unwrap();
        let texts: Vec<&str> = gallery.iter().map(|g| g.goal.goal_text.as_str()).collect();
        assert_eq!(texts, vec!["Third", "First"]);
        assert!(gallery.iter().all(HaradaGrid::is_complete));

        let limited = load_public_grids(&store, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
