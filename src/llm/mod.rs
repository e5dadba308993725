//! Generation engine abstraction.
//!
//! `GenerationEngine` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Engines are built once at startup and borrowed by the chat loop. Streaming
//! is pull-based: [`GenerationEngine::stream`] returns a [`FragmentStream`]
//! and the caller asks for one fragment at a time until it yields `None`.

pub mod providers;
pub mod sse;

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed stream: {0}")]
    Stream(String),
    #[error("no choices in completion response")]
    EmptyCompletion,
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message. Serializes directly into the chat completions
/// `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// An ordered message list plus the new-token budget.
///
/// Template rendering (including the generation-prompt suffix) is the
/// engine's job; callers only supply messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self { messages, max_tokens }
    }
}

// ── Engine enum ───────────────────────────────────────────────────────────────

/// All available engine backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new arms below.
#[derive(Debug, Clone)]
pub enum GenerationEngine {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
    Qwen(providers::qwen::QwenProvider),
}

impl GenerationEngine {
    /// Start a streamed generation. Fragments are pulled from the returned
    /// stream; nothing is produced until the caller asks.
    pub async fn stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        match self {
            GenerationEngine::Dummy(p) => p.stream(request),
            GenerationEngine::OpenAiCompatible(p) => p.stream(request).await,
            GenerationEngine::Qwen(p) => p.stream(request).await,
        }
    }

    /// Run a blocking (non-streamed) generation and return the decoded text.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, EngineError> {
        match self {
            GenerationEngine::Dummy(p) => p.complete(request),
            GenerationEngine::OpenAiCompatible(p) => p.complete(request).await,
            GenerationEngine::Qwen(p) => p.complete(request).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerationEngine::Dummy(_) => "dummy",
            GenerationEngine::OpenAiCompatible(_) => "openai",
            GenerationEngine::Qwen(_) => "qwen",
        }
    }
}

// ── Fragment stream ───────────────────────────────────────────────────────────

/// Incremental output of one generation.
///
/// `next_fragment` yields `Ok(Some(text))` zero or more times, then
/// `Ok(None)` once the engine signals completion. Further calls after the
/// end keep returning `Ok(None)`.
#[derive(Debug)]
pub enum FragmentStream {
    /// Pre-computed fragments (dummy engine).
    Scripted(VecDeque<String>),
    /// Pre-computed fragments, then no end signal at all (dummy engine
    /// standing in for a server that stops sending mid-reply).
    Stalled(VecDeque<String>),
    /// Server-sent events from an OpenAI-compatible endpoint.
    Sse(sse::SseStream),
}

impl FragmentStream {
    pub fn scripted<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FragmentStream::Scripted(fragments.into_iter().map(Into::into).collect())
    }

    pub async fn next_fragment(&mut self) -> Result<Option<String>, EngineError> {
        match self {
            FragmentStream::Scripted(queue) => Ok(queue.pop_front()),
            FragmentStream::Stalled(queue) => match queue.pop_front() {
                Some(fragment) => Ok(Some(fragment)),
                None => std::future::pending().await,
            },
            FragmentStream::Sse(s) => s.next_fragment().await,
        }
    }
}
