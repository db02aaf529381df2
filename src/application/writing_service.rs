use crate::domain::inference::TextPipeline;
use crate::domain::writing::{GRAMMAR_PREFIX, WritingMode};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct WritingService {
    grammar: Arc<dyn TextPipeline>,
    writer: Arc<dyn TextPipeline>,
}

impl WritingService {
    pub fn new(grammar: Arc<dyn TextPipeline>, writer: Arc<dyn TextPipeline>) -> Self {
        Self { grammar, writer }
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn correct(&self, text: &str) -> Result<String> {
        let prompt = format!("{}{}", GRAMMAR_PREFIX, text);
        self.grammar.run(&prompt).await
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn assist(&self, prompt: &str, mode: &str) -> Result<String> {
        let mode = WritingMode::resolve(mode);
        debug!(mode = ?mode, "Writing mode selected");

        let completion = self.writer.run(&mode.render(prompt)).await?;
        Ok(completion.trim().to_string())
    }
}
