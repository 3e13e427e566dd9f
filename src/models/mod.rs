pub mod ollama;

use serde::{Deserialize, Serialize};

use crate::options::InferenceOptions;

pub use ollama::{Connectivity, KeepAliveUnit, OllamaClient};

/// One non-streaming generation call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<InferenceOptions>,
    pub keep_alive: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Synchronous text generation backend.
pub trait Generate {
    fn generate(&mut self, request: &GenerateRequest) -> Result<GenerateResponse, InferenceError>;
}

impl<G: Generate + ?Sized> Generate for Box<G> {
    fn generate(&mut self, request: &GenerateRequest) -> Result<GenerateResponse, InferenceError> {
        (**self).generate(request)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}
