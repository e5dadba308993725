//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `MEMCHAT_LOG_LEVEL` and
//! `MEMCHAT_MEMORY_ENDPOINT` env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `ChatConfig`, …).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`.

mod load;
mod raw;
mod types;

pub use load::{load, load_from, Overrides};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests: dummy LLM, dummy memory store, no API keys,
    /// no external calls.
    pub fn test_default() -> Self {
        Self {
            log_level: "info".into(),
            log_file: None,
            chat: ChatConfig {
                fallback_prompt: raw::default_fallback_prompt(),
                input_label: raw::default_input_label(),
                reply_label: String::new(),
                system_prompt: None,
                response_max_tokens: raw::default_response_max_tokens(),
                summary_max_tokens: raw::default_summary_max_tokens(),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
                qwen: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "qwen-test".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
            memory: MemoryConfig {
                enabled: false,
                endpoint: raw::default_memory_endpoint(),
                uid: raw::default_memory_uid(),
                llm_id: raw::default_memory_llm_id(),
                timeout_seconds: 1,
                on_failure: FailurePolicy::Report,
                skip_null: false,
            },
        }
    }
}
