//! Qwen chat completion provider.
//!
//! Wraps the generic OpenAI-compatible provider and uses `[llm.qwen]` config
//! so local Qwen endpoints can be selected with `llm.default = "qwen"`.
//! Thinking-mode models prefix their answer with a `<think>…</think>` block;
//! non-streamed completions have it stripped so only the answer is returned.

use crate::llm::{ChatRequest, EngineError, FragmentStream};

use super::openai_compatible::OpenAiCompatibleProvider;

const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Clone)]
pub struct QwenProvider {
    inner: OpenAiCompatibleProvider,
}

impl QwenProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, EngineError> {
        let inner = OpenAiCompatibleProvider::new(
            api_base_url,
            model,
            temperature,
            timeout_seconds,
            api_key,
        )?;
        Ok(Self { inner })
    }

    pub async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        self.inner.stream(request).await
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<String, EngineError> {
        let text = self.inner.complete(request).await?;
        Ok(strip_thinking(&text).to_string())
    }
}

/// Return the answer part of a completion: everything after the last
/// `</think>` marker, trimmed of surrounding newlines. Text without a marker
/// is returned whole.
pub fn strip_thinking(text: &str) -> &str {
    let answer = match text.rfind(THINK_CLOSE) {
        Some(idx) => &text[idx + THINK_CLOSE.len()..],
        None => text,
    };
    answer.trim_matches('\n')
}
