//! Goal decomposition entry points.
//!
//! A [`GoalGenerator`] turns goal text into a validated [`GridDraft`]. Two
//! implementations exist:
//! - [`TemplateGenerator`]: deterministic, keyword-classified static templates
//! - [`LlmGenerator`]: one chat-completion call, strictly validated
//!
//! Both return drafts that already passed [`validate_shape`], so callers can
//! persist the result without further checks.
//!
//! [`validate_shape`]: crate::grid::validate_shape

mod llm;

pub use llm::{
    build_system_prompt, build_user_prompt, parse_reply, LlmGenerator, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE, REFUSAL_SENTENCE,
};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, GeneratorMode};
use crate::grid::{assemble, classify, resolve, GenerationError, GridDraft};
use crate::llm::ChatCompletionsClient;

pub const GOAL_TEXT_REQUIRED: &str = "Goal text is required";

/// Reject empty or whitespace-only goal text. Returns the trimmed text.
pub fn validate_goal_text(goal_text: &str) -> Result<&str, GenerationError> {
    let trimmed = goal_text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Validation(GOAL_TEXT_REQUIRED.to_string()));
    }
    Ok(trimmed)
}

/// Produces an 8x8 grid draft for a goal.
#[async_trait]
pub trait GoalGenerator: Send + Sync {
    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Generate a validated draft. Fails with `Validation` on empty text.
    async fn generate(&self, goal_text: &str) -> Result<GridDraft, GenerationError>;
}

pub type GeneratorRef = Arc<dyn GoalGenerator>;

/// Deterministic generator backed by the static template library.
///
/// Only the classifier looks at the goal text; every non-marathon goal gets
/// the same generic grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`GoalGenerator::generate`].
    pub fn generate_sync(&self, goal_text: &str) -> Result<GridDraft, GenerationError> {
        let goal_text = validate_goal_text(goal_text)?;
        let set_id = classify(goal_text);
        tracing::debug!("Classified goal as {} template set", set_id);
        assemble(resolve(set_id))
    }
}

#[async_trait]
impl GoalGenerator for TemplateGenerator {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, goal_text: &str) -> Result<GridDraft, GenerationError> {
        self.generate_sync(goal_text)
    }
}

/// Build the generator selected by the configuration.
pub fn from_config(config: &Config) -> GeneratorRef {
    match config.generator {
        GeneratorMode::Llm => {
            let api_key = config.llm.api_key.clone().unwrap_or_default();
            let client = Arc::new(ChatCompletionsClient::with_url(
                config.llm.api_url.clone(),
                api_key,
            ));
            tracing::info!(
                "Using LLM generator: model={} url={}",
                config.llm.model,
                config.llm.api_url
            );
            Arc::new(
                LlmGenerator::new(client, config.llm.model.clone())
                    .with_temperature(config.llm.temperature),
            )
        }
        GeneratorMode::Template => {
            tracing::info!("Using template generator");
            Arc::new(TemplateGenerator::new())
        }
    }
}
