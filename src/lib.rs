//! # Harada
//!
//! Turns one free-text goal into a Harada Method plan: the goal at the
//! centre, 8 supporting pillars around it, and 8 concrete tasks under each
//! pillar (64 tasks in total).
//!
//! This library provides:
//! - Deterministic, keyword-selected template grids
//! - An LLM-backed generator speaking the OpenAI chat-completions protocol
//! - Persistence of goals, pillars and tasks with share tokens
//! - An HTTP API for generating, saving, sharing and browsing grids
//!
//! ## Generation Flow
//! 1. Validate and trim the goal text
//! 2. Pick a generator (template tables or LLM)
//! 3. Check the 8x8 shape and re-derive positions from order
//! 4. Optionally persist goal, pillars and tasks, in that order
//!
//! ## Modules
//! - `grid`: Domain types, classifier, templates, assembler, 9x9 layout
//! - `generator`: Template and LLM generators
//! - `llm`: Chat-completions client
//! - `store`: SQLite and Supabase persistence
//! - `share`: Share URLs and social links
//! - `api`: HTTP routes

pub mod api;
pub mod config;
pub mod generator;
pub mod grid;
pub mod llm;
pub mod share;
pub mod store;

pub use config::Config;
pub use generator::{GeneratorRef, GoalGenerator, LlmGenerator, TemplateGenerator};
pub use grid::{GenerationError, GridDraft, HaradaGrid};
pub use store::{GoalStore, SharedStore};
