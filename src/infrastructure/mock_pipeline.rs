//! Deterministic [`TextPipeline`] for tests and offline development.

use crate::domain::error::DomainError;
use crate::domain::inference::{Pipelines, TextPipeline};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Behavior {
    Fixed(String),
    Echo(String),
    Fail(String),
}

#[derive(Clone)]
pub struct MockPipeline {
    behavior: Behavior,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPipeline {
    /// Always answers `response`.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fixed(response.into()))
    }

    /// Answers `prefix` followed by the input.
    pub fn echo(prefix: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Echo(prefix.into()))
    }

    /// Fails every call with an inference error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Inputs received so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl TextPipeline for MockPipeline {
    async fn run(&self, input: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(input.to_string());

        match &self.behavior {
            Behavior::Fixed(response) => Ok(response.clone()),
            Behavior::Echo(prefix) => Ok(format!("{}{}", prefix, input)),
            Behavior::Fail(message) => Err(DomainError::Inference(message.clone()).into()),
        }
    }
}

impl Pipelines {
    /// Offline pipelines: echoing grammar and writer, fixed summarizer.
    pub fn mock() -> Self {
        Self {
            grammar: Arc::new(MockPipeline::echo("")),
            summarizer: Arc::new(MockPipeline::fixed("A short summary.")),
            writer: Arc::new(MockPipeline::echo("")),
        }
    }
}
