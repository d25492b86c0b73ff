pub mod extract;
pub mod gemini;
pub mod ollama;

use async_trait::async_trait;

/// One-shot text-in/text-out oracle. Output is free text and must always go
/// through the defensive parsers in `extract`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
