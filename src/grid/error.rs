use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// Failures of a single goal decomposition request.
///
/// All variants are terminal for the request; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The goal text was empty or whitespace-only.
    #[error("{0}")]
    Validation(String),

    /// The text-generation service was unreachable or returned a non-success status.
    #[error("Upstream generation failed: {0}")]
    Upstream(#[from] LlmError),

    /// The reply was not JSON, or had no `pillars` array.
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    /// The grid does not have 8 pillars of 8 tasks.
    #[error("Shape violation: {0}")]
    ShapeViolation(String),

    /// Persisting or loading the grid failed.
    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),
}

impl GenerationError {
    /// Client-facing message. Only validation failures carry their detail.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(message) => message,
            _ => "Failed to generate goal plan",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_detail() {
        let err = GenerationError::ShapeViolation("Expected 8 pillars, got 6".to_string());
        assert_eq!(err.public_message(), "Failed to generate goal plan");
        assert!(err.to_string().contains("got 6"));

        let err = GenerationError::Validation("Goal text is required".to_string());
        assert_eq!(err.public_message(), "Goal text is required");
        assert!(err.is_validation());
    }
}
