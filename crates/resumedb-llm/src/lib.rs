//! resumedb-llm
//!
//! Text-completion backends behind `resumedb_core::traits::Completer`.

use std::time::Duration;

use tracing::info;

use resumedb_core::config::{LlmBackend, LlmConfig};
use resumedb_core::traits::Completer;
use resumedb_core::{Error, Result};

pub mod hosted;
pub mod ollama;

pub use hosted::{extract_text, HostedChatClient};
pub use ollama::OllamaClient;

pub const SYSTEM_PROMPT: &str = "You are an AI hiring assistant helping evaluate resumes.";

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| Error::InvalidConfig(format!("llm http client: {e}")))
}

pub(crate) fn service_err(backend: &str, e: impl std::fmt::Display) -> Error {
    Error::ExternalService(format!("{backend}: {e}"))
}

pub(crate) fn base_or_default<'a>(base_url: &'a str, default: &'a str) -> &'a str {
    if base_url.trim().is_empty() {
        default
    } else {
        base_url.trim_end_matches('/')
    }
}

fn hosted_api_key(config: &LlmConfig) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var("BYTEZ_API_KEY").ok().filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| {
            Error::InvalidConfig("llm.api_key is not set for the hosted backend".into())
        })
}

/// Build the completer selected by `llm.backend`. The hosted backend reads its
/// key from `llm.api_key`, falling back to `BYTEZ_API_KEY`.
pub fn completer_from_config(config: &LlmConfig) -> Result<Box<dyn Completer>> {
    let completer: Box<dyn Completer> = match config.backend {
        LlmBackend::Hosted => Box::new(HostedChatClient::new(
            &config.base_url,
            &config.model,
            hosted_api_key(config)?,
            config.timeout_secs,
        )?),
        LlmBackend::Ollama => Box::new(OllamaClient::new(
            &config.base_url,
            &config.model,
            config.timeout_secs,
        )?),
    };
    info!(
        backend = config.backend.as_str(),
        completer = completer.id(),
        "explanation backend ready"
    );
    Ok(completer)
}
