//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `MEMCHAT_LOG_LEVEL` / `MEMCHAT_MEMORY_ENDPOINT` overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

use super::raw::{self, RawConfig, RawEndpoint};
use super::types::*;

/// Values that take precedence over the file.
///
/// Sourced from the environment by [`load`]; tests build them directly
/// instead of mutating process env.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub memory_endpoint: Option<String>,
    pub llm_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("MEMCHAT_LOG_LEVEL").ok(),
            memory_endpoint: env::var("MEMCHAT_MEMORY_ENDPOINT").ok(),
            llm_api_key: env::var("LLM_API_KEY").ok(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; the overlay only needs to specify keys that
/// differ from the base. For every other type the overlay value replaces the
/// base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. With no explicit path and no default file on disk,
/// the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        resolve(RawConfig::default(), &overrides)
    }
}

/// Internal loader: accepts an explicit path and overrides.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let log_level = overrides
        .log_level
        .clone()
        .unwrap_or(parsed.log.log_level);
    logger::parse_level(&log_level).map_err(|e| AppError::Config(e.to_string()))?;

    let on_failure = parsed
        .memory
        .on_failure
        .parse::<FailurePolicy>()
        .map_err(AppError::Config)?;

    let chat = parsed.chat;
    if chat.response_max_tokens == 0 || chat.summary_max_tokens == 0 {
        return Err(AppError::Config("chat token budgets must be greater than zero".into()));
    }

    Ok(Config {
        log_level,
        log_file: parsed.log.log_file.map(PathBuf::from),
        chat: ChatConfig {
            fallback_prompt: chat.fallback_prompt,
            input_label: chat.input_label,
            reply_label: chat.reply_label,
            system_prompt: chat.system_prompt.filter(|s| !s.trim().is_empty()),
            response_max_tokens: chat.response_max_tokens,
            summary_max_tokens: chat.summary_max_tokens,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: resolve_endpoint(
                parsed.llm.openai,
                raw::default_openai_api_base_url,
                raw::default_openai_model,
            ),
            qwen: resolve_endpoint(
                parsed.llm.qwen,
                raw::default_qwen_api_base_url,
                raw::default_qwen_model,
            ),
        },
        llm_api_key: overrides.llm_api_key.clone(),
        memory: MemoryConfig {
            enabled: parsed.memory.enabled,
            endpoint: overrides
                .memory_endpoint
                .clone()
                .unwrap_or(parsed.memory.endpoint),
            uid: parsed.memory.uid,
            llm_id: parsed.memory.llm_id,
            timeout_seconds: parsed.memory.timeout_seconds,
            on_failure,
            skip_null: parsed.memory.skip_null,
        },
    })
}

fn resolve_endpoint(
    raw: RawEndpoint,
    default_url: fn() -> String,
    default_model: fn() -> String,
) -> OpenAiConfig {
    OpenAiConfig {
        api_base_url: raw.api_base_url.unwrap_or_else(default_url),
        model: raw.model.unwrap_or_else(default_model),
        temperature: raw.temperature,
        timeout_seconds: raw.timeout_seconds,
    }
}
