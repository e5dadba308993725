//! Application-wide error types.

use thiserror::Error;

use crate::llm::EngineError;
use crate::memory::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("generation failed: {0}")]
    Engine(#[from] EngineError),

    #[error("memory store failed: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
