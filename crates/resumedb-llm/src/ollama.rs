use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use resumedb_core::traits::Completer;
use resumedb_core::Result;

use crate::{base_or_default, http_client, service_err, SYSTEM_PROMPT};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Local Ollama server, non-streaming `/api/generate`.
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    id: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
        let base = base_or_default(base_url, DEFAULT_BASE_URL);
        Ok(Self {
            client: http_client(timeout_secs)?,
            endpoint: format!("{base}/api/generate"),
            model: model.to_string(),
            id: format!("ollama:{model}"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Completer for OllamaClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
            stream: false,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| service_err(&self.id, e))?;
        let status = response.status();
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| service_err(&self.id, format!("HTTP {status}: {e}")))?;
        if let Some(error) = body.error {
            return Err(service_err(&self.id, error));
        }
        if !status.is_success() {
            return Err(service_err(&self.id, format!("HTTP {status}")));
        }
        debug!(completer = %self.id, chars = body.response.len(), "completion received");
        Ok(body.response.trim().to_string())
    }
}
