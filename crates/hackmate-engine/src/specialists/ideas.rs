use crate::client::ModelClient;
use crate::error::Result;

const IDEA_PROMPT: &str = "You are a Creative Hackathon Idea Generator.
The student wants to build something innovative.

Requested Theme: {theme}
Student Tech Stack: {tech_stack}

Generate 3 unique and viable project ideas.
Output format:
1. [Project Name] - [Description]
2. [Project Name] - [Description]
3. [Project Name] - [Description]";

/// Stateless prompt-to-text transform. No persisted-data dependency, no
/// fallback.
pub async fn generate<M: ModelClient + ?Sized>(
    model: &M,
    theme: &str,
    tech_stack: &str,
) -> Result<String> {
    let prompt = IDEA_PROMPT
        .replace("{theme}", theme)
        .replace("{tech_stack}", tech_stack);
    model.complete(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocks::MockModelClient;
    use crate::error::EngineError;

    #[tokio::test]
    async fn passes_text_through() {
        let model = MockModelClient::new(vec!["1. RoverBot - a robot".to_string()]);
        let text = generate(&model, "robotics", "Rust, Embedded").await.unwrap();
        assert_eq!(text, "1. RoverBot - a robot");
    }

    #[tokio::test]
    async fn propagates_model_failure() {
        let model = MockModelClient::failing();
        let err = generate(&model, "robotics", "Rust").await.unwrap_err();
        assert!(matches!(err, EngineError::UpstreamModel(_)));
    }
}
