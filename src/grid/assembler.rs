//! Turns template sets into positioned drafts and enforces the 8x8 shape.

use super::error::GenerationError;
use super::templates::TemplateSet;
use super::{GridDraft, PillarDraft, TaskDraft, PILLAR_COUNT, TASKS_PER_PILLAR};

/// Build a positioned draft from a template set.
///
/// Template sets are fixed-size arrays, so the shape check cannot fail here;
/// it still runs so every draft passes through the same gate.
pub fn assemble(set: &TemplateSet) -> Result<GridDraft, GenerationError> {
    let pillars = set
        .iter()
        .map(|pillar| {
            (
                pillar.name.to_string(),
                pillar.tasks.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect();

    let draft = reindex(pillars);
    validate_shape(&draft)?;
    Ok(draft)
}

/// Assign 1-based positions from sequence order.
pub fn reindex(pillars: Vec<(String, Vec<String>)>) -> GridDraft {
    GridDraft {
        pillars: pillars
            .into_iter()
            .enumerate()
            .map(|(index, (pillar_text, tasks))| PillarDraft {
                pillar_text,
                position: (index + 1) as u8,
                tasks: tasks
                    .into_iter()
                    .enumerate()
                    .map(|(task_index, task_text)| TaskDraft {
                        task_text,
                        position: (task_index + 1) as u8,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Check cardinality and positions of a draft.
pub fn validate_shape(draft: &GridDraft) -> Result<(), GenerationError> {
    if draft.pillars.len() != PILLAR_COUNT {
        return Err(GenerationError::ShapeViolation(format!(
            "Expected {} pillars, got {}",
            PILLAR_COUNT,
            draft.pillars.len()
        )));
    }

    for (index, pillar) in draft.pillars.iter().enumerate() {
        if pillar.position as usize != index + 1 {
            return Err(GenerationError::ShapeViolation(format!(
                "Pillar \"{}\" has position {}, expected {}",
                pillar.pillar_text,
                pillar.position,
                index + 1
            )));
        }
        if pillar.tasks.len() != TASKS_PER_PILLAR {
            return Err(GenerationError::ShapeViolation(format!(
                "Pillar \"{}\" must have exactly {} tasks, got {}",
                pillar.pillar_text,
                TASKS_PER_PILLAR,
                pillar.tasks.len()
            )));
        }
        for (task_index, task) in pillar.tasks.iter().enumerate() {
            if task.position as usize != task_index + 1 {
                return Err(GenerationError::ShapeViolation(format!(
                    "Task {} of pillar \"{}\" has position {}",
                    task_index + 1,
                    pillar.pillar_text,
                    task.position
                )));
            }
        }
    }

    Ok(())
}
