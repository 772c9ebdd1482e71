//! Answer generation grounded in retrieved resource chunks

pub mod gemini;

use crate::search::ScoredChunk;
use crate::Result;
use async_trait::async_trait;

pub use gemini::GeminiChat;

/// Reply used when the question cannot be embedded
pub const UNPROCESSABLE_REPLY: &str = "Sorry, I couldn't process your question.";

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model(&self) -> &str;
}

/// Build the prompt that restricts the answer to the team's resources
pub fn build_prompt(message: &str, context: &[ScoredChunk]) -> String {
    let context_text = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::new();
    prompt.push_str("You are a helpful AI assistant for a trading research team.\n\n");
    prompt.push_str("Use this context from the team's internal resources to answer the user question.\n");
    prompt.push_str(
        "If the context is not relevant, say that you could not find an answer in the knowledge base.\n\n",
    );
    prompt.push_str("CONTEXT FROM TEAM RESOURCES:\n---\n");
    prompt.push_str(&context_text);
    prompt.push_str("\n---\n\n");
    prompt.push_str("USER QUESTION: ");
    prompt.push_str(message);
    prompt.push_str("\n\nANSWER:\n");
    prompt
}

/// Resource names in first-seen order without repeats
pub fn unique_sources(context: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for chunk in context {
        if !sources.contains(&chunk.resource_name) {
            sources.push(chunk.resource_name.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, resource: &str) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            resource_name: resource.to_string(),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = build_prompt(
            "Where is the carry?",
            &[scored("JPY funds the carry", "fx.pdf"), scored("rates diverge", "fx.pdf")],
        );
        assert!(prompt.contains("JPY funds the carry\nrates diverge"));
        assert!(prompt.contains("USER QUESTION: Where is the carry?"));
        assert!(prompt.ends_with("ANSWER:\n"));
    }

    #[test]
    fn test_unique_sources_keeps_order() {
        let context = [scored("a", "b.pdf"), scored("b", "a.csv"), scored("c", "b.pdf")];
        assert_eq!(unique_sources(&context), vec!["b.pdf", "a.csv"]);
    }
}
