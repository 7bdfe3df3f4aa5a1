//! Places a grid on the 9x9 Harada board.
//!
//! The board is a 3x3 arrangement of 3x3 blocks. The goal sits in the centre
//! block; pillars go clockwise from the top-left block:
//!
//! ```text
//! 1 2 3
//! 8 G 4
//! 7 6 5
//! ```
//!
//! Each pillar block has the pillar name in its centre cell and tasks 1-8 in
//! the remaining cells, row by row.

use serde::Serialize;

use super::HaradaGrid;

/// Board side length in cells.
pub const BOARD_SIZE: usize = 9;

/// Outer block (row, col) for each pillar position, 1-based position = index + 1.
const PILLAR_BLOCKS: [(usize, usize); 8] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 2),
    (2, 2),
    (2, 1),
    (2, 0),
    (1, 0),
];

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Goal { text: String },
    Pillar { position: u8, text: String },
    Task { pillar: u8, position: u8, text: String },
}

pub type Layout = [[Cell; BOARD_SIZE]; BOARD_SIZE];

/// Lay out a grid. Missing pillars or tasks leave empty cells.
pub fn layout(grid: &HaradaGrid) -> Layout {
    let mut sorted = grid.clone();
    sorted.sort_by_position();

    let mut board: Layout = std::array::from_fn(|_| std::array::from_fn(|_| Cell::Empty));

    board[4][4] = Cell::Goal {
        text: sorted.goal.goal_text.clone(),
    };

    for (entry, &(block_row, block_col)) in sorted.pillars.iter().zip(PILLAR_BLOCKS.iter()) {
        for index in 0..9 {
            let row = block_row * 3 + index / 3;
            let col = block_col * 3 + index % 3;

            board[row][col] = if index == 4 {
                Cell::Pillar {
                    position: entry.pillar.position,
                    text: entry.pillar.pillar_text.clone(),
                }
            } else {
                let task_index = if index < 4 { index } else { index - 1 };
                match entry.tasks.get(task_index) {
                    Some(task) => Cell::Task {
                        pillar: entry.pillar.position,
                        position: task.position,
                        text: task.task_text.clone(),
                    },
                    None => Cell::Empty,
                }
            };
        }
    }

    board
}

/// Plain-text outline: the goal, then each pillar with its numbered tasks.
pub fn render_outline(grid: &HaradaGrid) -> String {
    let mut sorted = grid.clone();
    sorted.sort_by_position();

    let mut out = format!("Goal: {}\n", sorted.goal.goal_text);
    for entry in &sorted.pillars {
        out.push_str(&format!(
            "\n{}. {}\n",
            entry.pillar.position, entry.pillar.pillar_text
        ));
        for task in &entry.tasks {
            out.push_str(&format!("   {}.{} {}\n", entry.pillar.position, task.position, task.task_text));
        }
    }
    out
}
