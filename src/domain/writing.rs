use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Instruction tag the grammar model was fine-tuned on.
pub const GRAMMAR_PREFIX: &str = "gec: ";

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionResponse {
    pub corrected_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistRequest {
    pub prompt: String,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistResponse {
    pub completion: String,
}

/// Prompt template used by the writing assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
    #[default]
    Default,
    Email,
    Idea,
    Casual,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown writing mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for WritingMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(WritingMode::Default),
            "email" => Ok(WritingMode::Email),
            "idea" => Ok(WritingMode::Idea),
            "casual" => Ok(WritingMode::Casual),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl WritingMode {
    /// Resolves a client-supplied mode, falling back to [`WritingMode::Default`].
    pub fn resolve(mode: &str) -> Self {
        mode.parse().unwrap_or_default()
    }

    pub fn render(self, prompt: &str) -> String {
        match self {
            WritingMode::Default => prompt.to_string(),
            WritingMode::Email => {
                format!("Write a polite and professional email about: {}", prompt)
            }
            WritingMode::Idea => format!("Brainstorm creative ideas for: {}", prompt),
            WritingMode::Casual => format!("Write casually about: {}", prompt),
        }
    }
}
