//! In-process store: acknowledges commands without sending them.
//!
//! Selected when `memory.enabled = false`; that store only logs each command.
//! `recording` and `failing` build the store test double, which keeps every
//! command it receives (`failing` simulates an unreachable endpoint).

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::StoreError;

#[derive(Debug, Clone, Default)]
pub struct DummyStore {
    fail_with: Option<String>,
    commands: Option<Arc<Mutex<Vec<String>>>>,
}

impl DummyStore {
    /// Log-only store for a disabled memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every command so callers can inspect what was sent.
    pub fn recording() -> Self {
        Self { commands: Some(Arc::default()), ..Self::default() }
    }

    /// Record, then reject every command with `StoreError::Request(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fail_with: Some(message.into()), ..Self::recording() }
    }

    /// Every command received so far, including rejected ones. Always empty
    /// for a log-only store.
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone())
            .unwrap_or_default()
    }

    pub fn send(&self, command: &str) -> Result<String, StoreError> {
        match &self.commands {
            Some(commands) => commands
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(command.to_string()),
            None => debug!(command, "memory store disabled: command not sent"),
        }
        match &self.fail_with {
            Some(message) => Err(StoreError::Request(message.clone())),
            None => Ok("stored (local)".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_only_store_acknowledges_without_keeping() {
        let s = DummyStore::new();
        for _ in 0..3 {
            assert_eq!(s.send("insert a").unwrap(), "stored (local)");
        }
        assert!(s.commands.is_none());
        assert!(s.commands().is_empty());
    }

    #[test]
    fn recording_keeps_commands_across_clones() {
        let s = DummyStore::recording();
        assert_eq!(s.send("insert a").unwrap(), "stored (local)");
        assert_eq!(s.clone().commands(), vec!["insert a".to_string()]);
    }

    #[test]
    fn failing_still_records() {
        let s = DummyStore::failing("connection refused");
        assert!(s.send("insert a").is_err());
        assert_eq!(s.commands().len(), 1);
    }
}
