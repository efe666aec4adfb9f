use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use resumedb_core::traits::Completer;
use resumedb_core::Result;

use crate::{base_or_default, http_client, service_err, SYSTEM_PROMPT};

pub const DEFAULT_BASE_URL: &str = "https://api.bytez.com/models/v2";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    output: Option<Value>,
}

/// Chat completion against a hosted model endpoint (`POST {base}/{model}`).
pub struct HostedChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    id: String,
}

impl HostedChatClient {
    pub fn new(base_url: &str, model: &str, api_key: String, timeout_secs: u64) -> Result<Self> {
        let base = base_or_default(base_url, DEFAULT_BASE_URL);
        Ok(Self {
            client: http_client(timeout_secs)?,
            endpoint: format!("{base}/{model}"),
            api_key,
            id: format!("hosted:{model}"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Completer for HostedChatClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| service_err(&self.id, e))?;
        let status = response.status();
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| service_err(&self.id, format!("HTTP {status}: {e}")))?;
        if let Some(error) = body.error.filter(|e| !e.is_null()) {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(service_err(&self.id, message));
        }
        if !status.is_success() {
            return Err(service_err(&self.id, format!("HTTP {status}")));
        }
        let text = body.output.as_ref().map(extract_text).unwrap_or_default();
        debug!(completer = %self.id, chars = text.len(), "completion received");
        Ok(text.trim().to_string())
    }
}

/// Flatten the shapes a hosted model may return into plain text: a string,
/// an object carrying `content` or `text`, or a list of either (joined by
/// newlines).
pub fn extract_text(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("content").or_else(|| map.get("text")) {
            Some(inner) => extract_text(inner),
            None => output.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => {
                    map.get("content").map(extract_text).unwrap_or_else(|| item.to_string())
                }
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_every_output_shape() {
        assert_eq!(extract_text(&json!("plain")), "plain");
        assert_eq!(
            extract_text(&json!({"role": "assistant", "content": "Fit:\n- Rust"})),
            "Fit:\n- Rust"
        );
        assert_eq!(extract_text(&json!({"text": "nested"})), "nested");
        assert_eq!(extract_text(&json!([{"content": "a"}, "b"])), "a\nb");
        assert_eq!(extract_text(&json!(null)), "");
        assert_eq!(extract_text(&json!({"other": 1})), r#"{"other":1}"#);
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let model = "microsoft/Phi-3-mini-4k-instruct";
        let client = HostedChatClient::new("", model, "k".into(), 5).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.bytez.com/models/v2/microsoft/Phi-3-mini-4k-instruct"
        );
        let client = HostedChatClient::new("http://localhost:9/", "m", "k".into(), 5).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/m");
        assert_eq!(client.id(), "hosted:m");
    }
}
