//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the chat loop and its
//! collaborators consume. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::str::FromStr;

// ── Chat ─────────────────────────────────────────────────────────────────────

/// Console loop settings (`[chat]`).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Substituted verbatim when the user submits an empty line.
    pub fallback_prompt: String,
    /// Printed before each input read.
    pub input_label: String,
    /// Printed before each streamed reply. Empty by default.
    pub reply_label: String,
    /// Optional persona sent as a system message ahead of the user turn.
    pub system_prompt: Option<String>,
    /// Token budget for the streamed reply.
    pub response_max_tokens: u32,
    /// Token budget for the memory summarization pass.
    pub summary_max_tokens: u32,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Connection settings for an OpenAI-compatible chat completions endpoint.
/// Used for both `[llm.openai]` and `[llm.qwen]`.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds. `0` disables the timeout.
    pub timeout_seconds: u64,
}

/// Generation engine configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`, `"qwen"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
    pub qwen: OpenAiConfig,
}

impl LlmConfig {
    /// Model name of the active provider, for logs and the startup banner.
    pub fn active_model(&self) -> &str {
        match self.provider.as_str() {
            "qwen" => &self.qwen.model,
            "dummy" => "dummy",
            _ => &self.openai.model,
        }
    }
}

// ── Memory store ─────────────────────────────────────────────────────────────

/// What the loop does when a memory record cannot be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log, print a short diagnostic, continue with the next turn.
    Report,
    /// Stop the loop with an error.
    Fatal,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(Self::Report),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!("unknown memory.on_failure '{other}' (expected \"report\" or \"fatal\")")),
        }
    }
}

/// Memory store settings (`[memory]`).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// When `false` records go to the in-process dummy store instead of HTTP.
    pub enabled: bool,
    /// Full URL of the `interpret` endpoint.
    pub endpoint: String,
    /// User identifier embedded in every record.
    pub uid: String,
    /// Model identifier embedded in every record.
    pub llm_id: String,
    /// HTTP timeout in seconds. `0` disables the timeout.
    pub timeout_seconds: u64,
    pub on_failure: FailurePolicy,
    /// Skip persisting summaries that are empty or null-like.
    pub skip_null: bool,
}

// ── Top-level ────────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Optional log file; logs go to stderr when unset.
    pub log_file: Option<PathBuf>,
    pub chat: ChatConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var: `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
    pub memory: MemoryConfig,
}
