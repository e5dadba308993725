//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults, so an
//! empty document deserializes into the built-in defaults. The `load` module
//! converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub log: RawLog,
    #[serde(default)]
    pub chat: RawChat,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub memory: RawMemory,
}

#[derive(Deserialize)]
pub(super) struct RawLog {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawLog {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_file: None }
    }
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawChat {
    #[serde(default = "default_fallback_prompt")]
    pub fallback_prompt: String,
    #[serde(default = "default_input_label")]
    pub input_label: String,
    #[serde(default)]
    pub reply_label: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_response_max_tokens")]
    pub response_max_tokens: u32,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

impl Default for RawChat {
    fn default() -> Self {
        Self {
            fallback_prompt: default_fallback_prompt(),
            input_label: default_input_label(),
            reply_label: String::new(),
            system_prompt: None,
            response_max_tokens: default_response_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: RawEndpoint,
    #[serde(default)]
    pub qwen: RawEndpoint,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai: RawEndpoint::default(),
            qwen: RawEndpoint::default(),
        }
    }
}

/// `[llm.openai]` / `[llm.qwen]`. Url and model stay `None` when absent so
/// each provider can fill in its own default at resolution time.
#[derive(Deserialize)]
pub(super) struct RawEndpoint {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawEndpoint {
    fn default() -> Self {
        Self {
            api_base_url: None,
            model: None,
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout_seconds(),
        }
    }
}

// ── Memory ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawMemory {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_memory_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_memory_uid")]
    pub uid: String,
    #[serde(default = "default_memory_llm_id")]
    pub llm_id: String,
    #[serde(default = "default_memory_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_on_failure")]
    pub on_failure: String,
    #[serde(default)]
    pub skip_null: bool,
}

impl Default for RawMemory {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_memory_endpoint(),
            uid: default_memory_uid(),
            llm_id: default_memory_llm_id(),
            timeout_seconds: default_memory_timeout_seconds(),
            on_failure: default_on_failure(),
            skip_null: false,
        }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_fallback_prompt() -> String {
    "Hello".to_string()
}

pub(super) fn default_input_label() -> String {
    "You:".to_string()
}

pub(super) fn default_response_max_tokens() -> u32 {
    16384
}

pub(super) fn default_summary_max_tokens() -> u32 {
    128
}

fn default_llm_provider() -> String {
    "qwen".to_string()
}

pub(super) fn default_openai_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

pub(super) fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub(super) fn default_qwen_api_base_url() -> String {
    "http://127.0.0.1:8081/v1/chat/completions".to_string()
}

pub(super) fn default_qwen_model() -> String {
    "Qwen/Qwen3-4B-Instruct-2507".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout_seconds() -> u64 {
    // Long replies (16k tokens) on local hardware routinely take minutes.
    600
}

pub(super) fn default_memory_endpoint() -> String {
    "http://localhost:8000/interpret".to_string()
}

pub(super) fn default_memory_uid() -> String {
    "330937".to_string()
}

pub(super) fn default_memory_llm_id() -> String {
    "qwen".to_string()
}

fn default_memory_timeout_seconds() -> u64 {
    30
}

fn default_on_failure() -> String {
    "report".to_string()
}
