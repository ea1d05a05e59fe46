//! Non-streaming OpenAI Chat Completions client.
//!
//! Implements [`InferenceClient`] against `/v1/chat/completions` (or the
//! Azure equivalent). Sends the full prompt and waits for the complete
//! reply; streaming delivery is out of scope for this application.

use anyhow::Context;

use super::{InferenceClient, LlmSettings, Message};

/// Client for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Create a new client with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait::async_trait]
impl InferenceClient for ChatCompletionsClient {
    async fn infer(&self, messages: &[Message]) -> anyhow::Result<String> {
        let url = self.settings.provider.chat_url(&self.settings.base_url);

        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": messages,
        });

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = rb.bearer_auth(k);
        }

        let resp = rb
            .send()
            .await
            .context("chat completions request failed")?
            .error_for_status()
            .context("chat completions returned error status")?;

        let v: serde_json::Value = resp
            .json()
            .await
            .context("chat completions response was not valid JSON")?;

        extract_reply(&v).context("chat completions response carried no reply text")
    }
}

/// Pull the reply text out of a completion response.
///
/// Primarily reads `choices[0].message.content`; some gateways return the
/// text under a top-level `response` or `result` key instead, so those are
/// accepted as fallbacks.
fn extract_reply(v: &serde_json::Value) -> Option<String> {
    if let Some(s) = v["choices"][0]["message"]["content"].as_str() {
        return Some(s.to_string());
    }
    if let Some(s) = v.get("response").and_then(|x| x.as_str()) {
        return Some(s.to_string());
    }
    if let Some(s) = v.get("result").and_then(|x| x.as_str()) {
        return Some(s.to_string());
    }
    None
}
