//! Grid generation through an external chat-completion model.
//!
//! The reply is decoded into `serde_json::Value` first and checked field by
//! field, so a partially wrong reply fails with a precise error instead of a
//! generic decode error. Positions are always re-derived from array order.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{validate_goal_text, GoalGenerator};
use crate::grid::{reindex, validate_shape, GenerationError, GridDraft, PILLAR_COUNT, TASKS_PER_PILLAR};
use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError, LlmErrorKind, ResponseFormat};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

/// Sentence the model is told to return for offensive goals.
pub const REFUSAL_SENTENCE: &str = "I cannot render this into the Harada Method. Please try again.";

/// Generator that asks a language model for the grid.
pub struct LlmGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f64,
}

impl LlmGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl GoalGenerator for LlmGenerator {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn generate(&self, goal_text: &str) -> Result<GridDraft, GenerationError> {
        let goal_text = validate_goal_text(goal_text)?;

        let messages = [
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_user_prompt(goal_text)),
        ];
        let options = ChatOptions {
            temperature: Some(self.temperature),
            max_tokens: None,
            response_format: Some(ResponseFormat::json_object()),
        };

        tracing::info!("Requesting grid from model {}", self.model);
        let response = self
            .client
            .chat_completion(&self.model, &messages, options)
            .await
            .map_err(upstream_error)?;

        tracing::debug!(
            "Validating model reply (finish_reason={:?})",
            response.finish_reason
        );
        let content = response.content.ok_or_else(|| {
            GenerationError::MalformedResponse("Reply has no content".to_string())
        })?;

        match parse_reply(&content) {
            Ok(draft) => {
                tracing::info!("Model reply accepted: {} tasks", draft.task_count());
                Ok(draft)
            }
            Err(e) => {
                tracing::warn!("Model reply rejected: {}", e);
                Err(e)
            }
        }
    }
}

// A completion envelope that cannot be decoded is a bad reply, not an outage.
fn upstream_error(error: LlmError) -> GenerationError {
    match error.kind {
        LlmErrorKind::Parse => GenerationError::MalformedResponse(error.to_string()),
        _ => GenerationError::Upstream(error),
    }
}

/// Instruction fixing the reply schema.
pub fn build_system_prompt() -> String {
    format!(
        r#"You are an expert in the Harada Method, a Japanese goal-achievement framework that systematically breaks down ambitious goals into actionable steps.

The Harada Method structure:
- 1 Central Goal (provided by user)
- {pillars} Strategic Pillars (key areas that support achieving the goal)
- {total} Actionable Tasks ({tasks} specific tasks per pillar)

Your job is to analyze the user's goal and create a highly personalized, realistic breakdown.

RULES:
1. Create exactly {pillars} pillars that are directly relevant to THIS SPECIFIC goal
2. Each pillar should represent a distinct strategic area needed to achieve the goal
3. For each pillar, create exactly {tasks} actionable, specific tasks
4. Tasks must be concrete actions, not vague advice (e.g., "Run 3x per week" not "Exercise more")
5. Tasks should progress logically from foundational to advanced within each pillar
6. Consider the goal's context, realistic timelines, and what actually works
7. Make tasks measurable and trackable when possible
8. Pillar names should be 2-4 words, clear and specific

Respond ONLY with valid JSON matching this exact structure:
{{
  "pillars": [
    {{
      "pillar_text": "Pillar Name",
      "tasks": [
        "Specific actionable task 1",
        "Specific actionable task 2",
        "Specific actionable task 3",
        "Specific actionable task 4",
        "Specific actionable task 5",
        "Specific actionable task 6",
        "Specific actionable task 7",
        "Specific actionable task 8"
      ]
    }}
  ]
}}

Make the breakdown inspiring yet realistic. Focus on what will actually help someone achieve this specific goal."#,
        pillars = PILLAR_COUNT,
        tasks = TASKS_PER_PILLAR,
        total = PILLAR_COUNT * TASKS_PER_PILLAR,
    )
}

/// User prompt carrying the goal and the moderation instruction.
pub fn build_user_prompt(goal_text: &str) -> String {
    format!(
        "Create a Harada Method breakdown for this goal: \"{goal}\"\n\n\
         Analyze this goal carefully. Make sure it is not offensive nor borderline offensive. \
         If it is, render '{refusal}' What are the {pillars} most important strategic pillars \
         needed to achieve it? What are the specific, actionable tasks within each pillar?",
        goal = goal_text,
        refusal = REFUSAL_SENTENCE,
        pillars = PILLAR_COUNT,
    )
}

/// Validate a model reply and convert it to a positioned draft.
///
/// Order of checks: JSON syntax and `pillars` presence (`MalformedResponse`),
/// pillar count, per-pillar task count (`ShapeViolation`), then text fields.
pub fn parse_reply(content: &str) -> Result<GridDraft, GenerationError> {
    let trimmed = content.trim();

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| not_a_grid(trimmed, format!("Reply is not valid JSON: {}", e)))?;

    let pillars = value
        .get("pillars")
        .and_then(Value::as_array)
        .ok_or_else(|| not_a_grid(trimmed, "Reply has no pillars array".to_string()))?;

    if pillars.len() != PILLAR_COUNT {
        return Err(GenerationError::ShapeViolation(format!(
            "Expected {} pillars, got {}",
            PILLAR_COUNT,
            pillars.len()
        )));
    }

    let mut entries = Vec::with_capacity(PILLAR_COUNT);
    for (index, pillar) in pillars.iter().enumerate() {
        let name = pillar_name(pillar);
        let label = name.clone().unwrap_or_else(|| format!("#{}", index + 1));

        let tasks = pillar
            .get("tasks")
            .and_then(Value::as_array)
            .filter(|tasks| tasks.len() == TASKS_PER_PILLAR)
            .ok_or_else(|| {
                GenerationError::ShapeViolation(format!(
                    "Pillar \"{}\" must have exactly {} tasks",
                    label, TASKS_PER_PILLAR
                ))
            })?;

        let name = name.ok_or_else(|| {
            GenerationError::MalformedResponse(format!("Pillar {} has no name", index + 1))
        })?;

        let texts = tasks
            .iter()
            .enumerate()
            .map(|(task_index, task)| {
                task_text(task).ok_or_else(|| {
                    GenerationError::MalformedResponse(format!(
                        "Task {} of pillar \"{}\" has no text",
                        task_index + 1,
                        label
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        entries.push((name, texts));
    }

    let draft = reindex(entries);
    validate_shape(&draft)?;
    Ok(draft)
}

// Only a reply without a grid can be a refusal; task text may quote the sentence.
fn not_a_grid(content: &str, detail: String) -> GenerationError {
    if content.contains(REFUSAL_SENTENCE) {
        GenerationError::MalformedResponse("Model refused the goal".to_string())
    } else {
        GenerationError::MalformedResponse(detail)
    }
}

fn pillar_name(pillar: &Value) -> Option<String> {
    ["pillar_text", "name"]
        .iter()
        .find_map(|key| pillar.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Tasks usually arrive as plain strings; some models wrap them in objects.
fn task_text(task: &Value) -> Option<String> {
    let text = match task {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => task.get("task_text").and_then(Value::as_str),
        _ => None,
    }?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, LlmError};
    use serde_json::json;
    use std::sync::Mutex;

    fn reply(pillars: usize, tasks: usize) -> Value {
        json!({
            "pillars": (0..pillars).map(|p| json!({
                "pillar_text": format!("Pillar {}", p + 1),
                "tasks": (0..tasks).map(|t| format!("Task {}.{}", p + 1, t + 1)).collect::<Vec<_>>(),
            })).collect::<Vec<_>>()
        })
    }

    struct FakeClient {
        reply: Result<Option<String>, LlmError>,
        seen: Mutex<Vec<(String, Vec<ChatMessage>, Option<ResponseFormat>)>>,
    }

    impl FakeClient {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(Some(content.to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for FakeClient {
        async fn chat_completion(
            &self,
            model: &str,
            messages: &[ChatMessage],
            options: ChatOptions,
        ) -> Result<ChatResponse, LlmError> {
            self.seen.lock().unwrap().push((
                model.to_string(),
                messages.to_vec(),
                options.response_format,
            ));
            self.reply.clone().map(|content| ChatResponse {
                content,
                finish_reason: Some("stop".to_string()),
                usage: None,
                model: Some(model.to_string()),
            })
        }
    }

    #[test]
    fn test_parse_valid_reply() {
        let draft = parse_reply(&reply(8, 8).to_string()).unwrap();
        assert_eq!(draft.pillars.len(), 8);
        assert_eq!(draft.pillars[7].position, 8);
        assert_eq!(draft.pillars[7].tasks[7].task_text, "Task 8.8");
        assert_eq!(draft.pillars[7].tasks[7].position, 8);
    }

    #[test]
    fn test_parse_ignores_upstream_positions() {
        let mut value = reply(8, 8);
        value["pillars"][0]["position"] = json!(5);
        value["pillars"][1]["tasks"] = json!((0..8)
            .map(|t| json!({"task_text": format!("Obj {}", t), "position": 1}))
            .collect::<Vec<_>>());
        let draft = parse_reply(&value.to_string()).unwrap();
        assert_eq!(draft.pillars[0].position, 1);
        let positions: Vec<u8> = draft.pillars[1].tasks.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(draft.pillars[1].tasks[3].task_text, "Obj 3");
    }

    #[test]
    fn test_parse_malformed() {
        for content in ["not json", "{\"plan\": []}", "{\"pillars\": 3}", REFUSAL_SENTENCE] {
            let err = parse_reply(content).unwrap_err();
            assert!(
                matches!(err, GenerationError::MalformedResponse(_)),
                "{} -> {:?}",
                content,
                err
            );
        }
    }

    #[test]
    fn test_parse_refusal() {
        for content in [
            REFUSAL_SENTENCE.to_string(),
            json!({ "error": REFUSAL_SENTENCE }).to_string(),
        ] {
            let err = parse_reply(&content).unwrap_err();
            assert!(matches!(err, GenerationError::MalformedResponse(ref m) if m == "Model refused the goal"));
        }
    }

    #[test]
    fn test_parse_grid_quoting_refusal_sentence() {
        let mut value = reply(8, 8);
        value["pillars"][3]["tasks"][0] = json!(format!("Never reply \"{}\"", REFUSAL_SENTENCE));
        let draft = parse_reply(&value.to_string()).unwrap();
        assert!(draft.pillars[3].tasks[0].task_text.contains(REFUSAL_SENTENCE));
    }

    #[test]
    fn test_parse_wrong_pillar_count() {
        let err = parse_reply(&reply(6, 8).to_string()).unwrap_err();
        assert!(matches!(err, GenerationError::ShapeViolation(_)));
        assert!(err.to_string().contains("got 6"));
    }

    #[test]
    fn test_parse_wrong_task_count_names_pillar() {
        let mut value = reply(8, 8);
        value["pillars"][2]["tasks"] = json!(["only one"]);
        let err = parse_reply(&value.to_string()).unwrap_err();
        assert!(matches!(err, GenerationError::ShapeViolation(_)));
        assert!(err.to_string().contains("Pillar 3"));

        let mut value = reply(8, 8);
        value["pillars"][4].as_object_mut().unwrap().remove("tasks");
        assert!(matches!(
            parse_reply(&value.to_string()).unwrap_err(),
            GenerationError::ShapeViolation(_)
        ));
    }

    #[test]
    fn test_parse_blank_text_fields() {
        let mut value = reply(8, 8);
        value["pillars"][0]["pillar_text"] = json!("  ");
        assert!(matches!(
            parse_reply(&value.to_string()).unwrap_err(),
            GenerationError::MalformedResponse(_)
        ));

        let mut value = reply(8, 8);
        value["pillars"][0]["tasks"][2] = json!(42);
        assert!(matches!(
            parse_reply(&value.to_string()).unwrap_err(),
            GenerationError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_prompts() {
        let system = build_system_prompt();
        assert!(system.contains("exactly 8 pillars"));
        assert!(system.contains("2-4 words"));
        let user = build_user_prompt("Learn Japanese");
        assert!(user.contains("\"Learn Japanese\""));
        assert!(user.contains(REFUSAL_SENTENCE));
    }

    #[tokio::test]
    async fn test_generate_single_call_with_json_format() {
        let client = Arc::new(FakeClient::replying(&reply(8, 8).to_string()));
        let generator = LlmGenerator::new(client.clone(), DEFAULT_MODEL);
        let draft = generator.generate("  Learn Japanese ").await.unwrap();
        assert_eq!(draft.task_count(), 64);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (model, messages, format) = &seen[0];
        assert_eq!(model, DEFAULT_MODEL);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("\"Learn Japanese\""));
        assert_eq!(format.as_ref(), Some(&ResponseFormat::json_object()));
    }

    #[tokio::test]
    async fn test_generate_upstream_failure_not_retried() {
        let client = Arc::new(FakeClient {
            reply: Err(LlmError::from_status(503, "unavailable".to_string())),
            seen: Mutex::new(Vec::new()),
        });
        let generator = LlmGenerator::new(client.clone(), DEFAULT_MODEL);
        let err = generator.generate("Learn Japanese").await.unwrap_err();
        assert!(matches!(err, GenerationError::Upstream(_)));
        assert_eq!(client.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_undecodable_envelope_is_malformed() {
        let client = Arc::new(FakeClient {
            reply: Err(LlmError::parse_error("No choices in response".to_string())),
            seen: Mutex::new(Vec::new()),
        });
        let err = LlmGenerator::new(client, DEFAULT_MODEL)
            .generate("Learn Japanese")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
        assert!(err.to_string().contains("No choices in response"));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_goal_without_calling() {
        let client = Arc::new(FakeClient::replying("{}"));
        let generator = LlmGenerator::new(client.clone(), DEFAULT_MODEL);
        assert!(generator.generate(" ").await.unwrap_err().is_validation());
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_missing_content() {
        let client = Arc::new(FakeClient {
            reply: Ok(None),
            seen: Mutex::new(Vec::new()),
        });
        let err = LlmGenerator::new(client, DEFAULT_MODEL)
            .generate("Learn Japanese")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }
}
