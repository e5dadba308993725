//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Covers OpenAI itself and local servers (vLLM, llama.cpp, Ollama, LM
//! Studio) that apply the model's chat template server side. All wire types
//! are private to this module: callers only see [`ChatRequest`] in and
//! text or a [`FragmentStream`] out.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::sse::SseStream;
use crate::llm::{ChatMessage, ChatRequest, EngineError, FragmentStream};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Constructed once at startup. Clones share one `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `timeout_seconds == 0` disables the client timeout. When present,
    /// `api_key` is sent as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, EngineError> {
        let mut builder = Client::builder();
        if timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| EngineError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    /// Start a streamed completion and hand back the live event stream.
    pub async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        let response = self.send(request, true).await?;
        Ok(FragmentStream::Sse(SseStream::new(response)))
    }

    /// One non-streamed round-trip; returns the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, EngineError> {
        let response = self.send(request, false).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize completion response");
            EngineError::Request(format!("failed to parse response body: {e}"))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or(EngineError::EmptyCompletion)
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, EngineError> {
        let payload = self.payload(request, stream);

        debug!(
            model = %payload.model,
            messages = payload.messages.len(),
            max_tokens = payload.max_tokens,
            stream,
            "sending completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full completion request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "completion request failed (transport)");
            EngineError::Request(e.to_string())
        })?;

        check_status(response).await
    }

    fn payload<'a>(&'a self, request: &'a ChatRequest, stream: bool) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: self.temperature,
            stream,
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env
            .error
            .code
            .map(|v| match v {
                serde_json::Value::String(s) => format!(" [code={s}]"),
                other => format!(" [code={other}]"),
            })
            .unwrap_or_default();
        format!("{}{code}", env.error.message)
    } else {
        body
    };

    error!(%status, %message, "completion request returned HTTP error");
    Err(EngineError::Status { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            "http://127.0.0.1:1/v1/chat/completions".into(),
            "test-model".into(),
            0.5,
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn payload_carries_budget_and_stream_flag() {
        let p = provider();
        let req = ChatRequest::new(vec![ChatMessage::user("hi")], 128);
        let json = serde_json::to_value(p.payload(&req, true)).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["max_tokens"], 128);
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let p = provider();
        let req = ChatRequest::new(vec![ChatMessage::user("hi")], 8);
        let err = p.complete(&req).await.unwrap_err();
        assert!(matches!(err, EngineError::Request(_)));
    }
}
