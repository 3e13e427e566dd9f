use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Generate, GenerateRequest, GenerateResponse, InferenceError};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// How long the server keeps the model loaded after a request.
///
/// Only `"minutes"` selects minutes; every other spelling, including a missing unit,
/// means hours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeepAliveUnit {
    Minutes,
    #[default]
    Hours,
}

impl KeepAliveUnit {
    pub fn parse(s: &str) -> Self {
        if s == "minutes" {
            Self::Minutes
        } else {
            Self::Hours
        }
    }

    pub fn suffix(self) -> char {
        match self {
            Self::Minutes => 'm',
            Self::Hours => 'h',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
        }
    }
}

impl fmt::Display for KeepAliveUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KeepAliveUnit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeepAliveUnit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Which server and model to talk to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    #[serde(default = "default_url")]
    pub url: String,
    pub model: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive: i64,
    #[serde(default)]
    pub keep_alive_unit: KeepAliveUnit,
}

fn default_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_keep_alive() -> i64 {
    5
}

impl Connectivity {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            model: model.into(),
            keep_alive: default_keep_alive(),
            keep_alive_unit: KeepAliveUnit::Minutes,
        }
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: i64, unit: KeepAliveUnit) -> Self {
        self.keep_alive = keep_alive;
        self.keep_alive_unit = unit;
        self
    }

    /// `keep_alive` in the server's duration syntax, e.g. `5m` or `2h`.
    pub fn keep_alive_string(&self) -> String {
        format!("{}{}", self.keep_alive, self.keep_alive_unit.suffix())
    }
}

/// Blocking client for Ollama's `/api/generate`.
pub struct OllamaClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl OllamaClient {
    /// Builds a client with no request timeout unless one is given.
    ///
    /// A bare `host:port` is treated as plain `http`.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: normalize_base_url(url),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.url)
    }
}

fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(flatten)]
    request: &'a GenerateRequest,
    stream: bool,
}

impl Generate for OllamaClient {
    fn generate(&mut self, request: &GenerateRequest) -> Result<GenerateResponse, InferenceError> {
        let url = self.endpoint();
        debug!(
            url = %url,
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "ollama generate"
        );

        let body = WireRequest {
            request,
            stream: false,
        };
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        serde_json::from_str(&text).map_err(|e| InferenceError::Parse(e.to_string()))
    }
}
