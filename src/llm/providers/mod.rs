//! Generation engine implementations.
//!
//! `build(config, api_key)` is the factory: called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;
pub mod qwen;

use crate::config::LlmConfig;
use crate::llm::{EngineError, GenerationEngine};

/// Construct a `GenerationEngine` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<GenerationEngine, EngineError> {
    match config.provider.as_str() {
        "dummy" => Ok(GenerationEngine::Dummy(dummy::DummyProvider::new())),
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(GenerationEngine::OpenAiCompatible(p))
        }
        "qwen" => {
            let q = &config.qwen;
            let p = qwen::QwenProvider::new(
                q.api_base_url.clone(),
                q.model.clone(),
                q.temperature,
                q.timeout_seconds,
                api_key,
            )?;
            Ok(GenerationEngine::Qwen(p))
        }
        _ => Err(EngineError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_each_known_provider() {
        let mut cfg = Config::test_default().llm;
        for (name, expected) in [
            ("dummy", "dummy"),
            ("openai", "openai"),
            ("openai-compatible", "openai"),
            ("qwen", "qwen"),
        ] {
            cfg.provider = name.into();
            let engine = build(&cfg, None).unwrap();
            assert_eq!(engine.name(), expected);
        }
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default().llm;
        cfg.provider = "llama-cpp-direct".into();
        let err = build(&cfg, None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProvider(p) if p == "llama-cpp-direct"));
    }
}
