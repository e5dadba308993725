//! Dummy engine: echoes the last message back, or plays a fixed script.
//!
//! Used to run the whole loop without a model server, and as the engine
//! test double. Every request is recorded so callers can inspect what the
//! loop asked for.

use std::sync::{Arc, Mutex};

use crate::llm::{ChatRequest, EngineError, FragmentStream};

#[derive(Debug, Clone)]
struct Script {
    fragments: Vec<String>,
    completion: String,
    stall: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    script: Option<Script>,
    fail_with: Option<String>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream exactly `fragments` and answer every completion with `completion`.
    pub fn scripted<I, S>(fragments: I, completion: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Some(Script {
                fragments: fragments.into_iter().map(Into::into).collect(),
                completion: completion.into(),
                stall: false,
            }),
            ..Self::default()
        }
    }

    /// Like [`scripted`](Self::scripted), but the stream never signals its
    /// end after the last fragment.
    pub fn stalled<I, S>(fragments: I, completion: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut provider = Self::scripted(fragments, completion);
        if let Some(script) = provider.script.as_mut() {
            script.stall = true;
        }
        provider
    }

    /// Fail every request with `EngineError::Request(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fail_with: Some(message.into()), ..Self::default() }
    }

    /// Snapshot of every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, request: &ChatRequest) -> Result<(), EngineError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        match &self.fail_with {
            Some(message) => Err(EngineError::Request(message.clone())),
            None => Ok(()),
        }
    }

    pub fn stream(&self, request: &ChatRequest) -> Result<FragmentStream, EngineError> {
        self.record(request)?;
        if let Some(script) = &self.script {
            let fragments = script.fragments.iter().cloned().collect();
            return Ok(if script.stall {
                FragmentStream::Stalled(fragments)
            } else {
                FragmentStream::Scripted(fragments)
            });
        }
        let echoed = format!("[echo] {}", last_content(request));
        Ok(FragmentStream::scripted(
            echoed.split_inclusive(' ').map(str::to_string).collect::<Vec<_>>(),
        ))
    }

    pub fn complete(&self, request: &ChatRequest) -> Result<String, EngineError> {
        self.record(request)?;
        match &self.script {
            Some(script) => Ok(script.completion.clone()),
            None => Ok(format!("[echo] {}", last_content(request))),
        }
    }
}

fn last_content(request: &ChatRequest) -> &str {
    request.messages.last().map(|m| m.content.as_str()).unwrap_or("")
}
