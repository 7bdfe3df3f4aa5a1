//! Grid module - the Harada grid data model and its deterministic builders.
//!
//! # Key Concepts
//! - Draft: a generated grid that has not been persisted yet (no ids)
//! - Grid: a persisted goal joined with its pillars and tasks
//! - Classifier: picks the template set for a goal
//! - Templates: static pillar/task tables
//! - Assembler: positions drafts and enforces the 8x8 shape
//! - Layout: places a grid on the 9x9 board used for rendering
//!
//! Every valid grid has exactly [`PILLAR_COUNT`] pillars and every pillar has
//! exactly [`TASKS_PER_PILLAR`] tasks, with 1-based dense positions.

mod assembler;
mod classifier;
mod error;
pub mod layout;
pub mod templates;

pub use assembler::{assemble, reindex, validate_shape};
pub use classifier::{classify, TemplateSetId, MARATHON_KEYWORDS};
pub use error::GenerationError;
pub use layout::{layout, render_outline, Cell, Layout};
pub use templates::{resolve, PillarTemplate, TemplateSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of pillars surrounding a goal.
pub const PILLAR_COUNT: usize = 8;

/// Number of tasks under each pillar.
pub const TASKS_PER_PILLAR: usize = 8;

/// A generated task, positioned within its pillar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub task_text: String,
    pub position: u8,
}

/// A generated pillar with its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarDraft {
    pub pillar_text: String,
    pub position: u8,
    pub tasks: Vec<TaskDraft>,
}

/// The output of a generator: 8 pillars of 8 tasks, not yet persisted.
///
/// Serializes to the body returned by the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDraft {
    pub pillars: Vec<PillarDraft>,
}

impl GridDraft {
    /// Total number of tasks across all pillars.
    pub fn task_count(&self) -> usize {
        self.pillars.iter().map(|p| p.tasks.len()).sum()
    }
}

/// A persisted goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub goal_text: String,
    pub is_public: bool,
    /// Opaque identifier for public lookup. Minted once, never changed.
    pub share_token: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A persisted pillar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub pillar_text: String,
    pub position: u8,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub pillar_id: Uuid,
    pub task_text: String,
    pub position: u8,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A pillar joined with its tasks, ordered by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarWithTasks {
    #[serde(flatten)]
    pub pillar: Pillar,
    pub tasks: Vec<Task>,
}

/// A fully materialized goal tree, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaradaGrid {
    pub goal: Goal,
    pub pillars: Vec<PillarWithTasks>,
}

impl HaradaGrid {
    /// Sort pillars and their tasks by position.
    pub fn sort_by_position(&mut self) {
        self.pillars.sort_by_key(|p| p.pillar.position);
        for pillar in &mut self.pillars {
            pillar.tasks.sort_by_key(|t| t.position);
        }
    }

    /// Whether this grid has the full 8x8 shape.
    pub fn is_complete(&self) -> bool {
        self.pillars.len() == PILLAR_COUNT
            && self.pillars.iter().all(|p| p.tasks.len() == TASKS_PER_PILLAR)
    }
}
