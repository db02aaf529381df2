use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A loaded text-to-text model.
///
/// Implementations hold no per-request state and are shared across workers.
#[async_trait]
pub trait TextPipeline: Send + Sync {
    async fn run(&self, input: &str) -> Result<String>;
}

/// The three models the service loads at startup.
#[derive(Clone)]
pub struct Pipelines {
    pub grammar: Arc<dyn TextPipeline>,
    pub summarizer: Arc<dyn TextPipeline>,
    pub writer: Arc<dyn TextPipeline>,
}
