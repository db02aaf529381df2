//! Client for models served behind the Hugging Face Inference API
//! (or any server speaking the same `{"inputs", "parameters"}` protocol,
//! e.g. a self-hosted text-generation-inference instance).

use crate::domain::error::DomainError;
use crate::domain::inference::{Pipelines, TextPipeline};
use crate::infrastructure::config::InferenceConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Decoding parameters forwarded with every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    pub do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationParams {
    pub fn grammar() -> Self {
        Self {
            max_length: Some(512),
            do_sample: false,
            ..Self::default()
        }
    }

    pub fn summary() -> Self {
        Self {
            max_length: Some(60),
            min_length: Some(15),
            do_sample: false,
            temperature: None,
        }
    }

    pub fn writing() -> Self {
        Self {
            max_length: Some(100),
            do_sample: true,
            temperature: Some(0.8),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParams,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct PipelineOutput {
    #[serde(alias = "summary_text", alias = "translation_text")]
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<PipelineOutput>),
    Single(PipelineOutput),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Batch(outputs) => {
                outputs.into_iter().next().map(|o| o.generated_text)
            }
            InferenceResponse::Single(output) => Some(output.generated_text),
        }
    }
}

pub struct HuggingFacePipeline {
    client: Client,
    endpoint: String,
    model: String,
    api_token: Option<String>,
    params: GenerationParams,
}

impl HuggingFacePipeline {
    pub fn new(
        client: Client,
        base_url: &str,
        model: &str,
        api_token: Option<String>,
        params: GenerationParams,
    ) -> Self {
        let endpoint = format!("{}/models/{}", base_url.trim_end_matches('/'), model);
        info!(model = %model, endpoint = %endpoint, "Registering inference pipeline");
        Self {
            client,
            endpoint,
            model: model.to_string(),
            api_token,
            params,
        }
    }
}

#[async_trait]
impl TextPipeline for HuggingFacePipeline {
    #[instrument(skip(self, input), fields(model = %self.model, input_len = input.len()))]
    async fn run(&self, input: &str) -> Result<String> {
        let start = Instant::now();
        let body = InferenceRequest {
            inputs: input,
            parameters: &self.params,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Inference(format!("Request to {} failed: {}", self.model, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Inference backend returned an error");
            return Err(DomainError::Inference(format!(
                "{} returned {}: {}",
                self.model, status, body
            ))
            .into());
        }

        let parsed: InferenceResponse = response.json().await.map_err(|e| {
            DomainError::Inference(format!("Failed to parse {} response: {}", self.model, e))
        })?;
        let text = parsed.into_text().ok_or_else(|| {
            DomainError::Inference(format!("{} returned no outputs", self.model))
        })?;

        debug!(
            output_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Inference complete"
        );
        Ok(text)
    }
}

/// Builds the grammar, summarization and writing pipelines once for the process.
pub fn build_pipelines(config: &InferenceConfig) -> Result<Pipelines> {
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let pipeline = |model: &str, params: GenerationParams| -> Arc<dyn TextPipeline> {
        Arc::new(HuggingFacePipeline::new(
            client.clone(),
            &config.base_url,
            model,
            config.api_token.clone(),
            params,
        ))
    };

    Ok(Pipelines {
        grammar: pipeline(&config.grammar_model, GenerationParams::grammar()),
        summarizer: pipeline(&config.summary_model, GenerationParams::summary()),
        writer: pipeline(&config.writing_model, GenerationParams::writing()),
    })
}
