//! Memory records and the stores they are persisted to.
//!
//! A [`MemoryRecord`] is the short summary of user intent produced once per
//! turn. It is rendered into a pseudo-SQL `insert` command and handed to a
//! [`MemoryStore`], which returns the store's reply text.
//!
//! Escaping is a plain `"` → `'` substitution so the command stays
//! well-formed. It is lossy: after rendering, a single quote that was a
//! double quote in the summary cannot be told apart from an original one.

pub mod dummy;
pub mod http;

use thiserror::Error;

use crate::config::MemoryConfig;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

// ── Record ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord {
    pub uid: String,
    pub llm_id: String,
    pub content: String,
}

impl MemoryRecord {
    pub fn new(uid: impl Into<String>, llm_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { uid: uid.into(), llm_id: llm_id.into(), content: content.into() }
    }

    /// Render the `insert` command sent to the store.
    pub fn to_command(&self) -> String {
        format!(
            "insert into memory('uid', 'llm_id', 'content') values ('{}', '{}', \"{}\");",
            self.uid,
            self.llm_id,
            escape_content(&self.content)
        )
    }

    /// `true` when the summarizer reported nothing worth keeping.
    pub fn is_null_like(&self) -> bool {
        let t = self.content.trim();
        t.is_empty()
            || ["null", "none", "\"\"", "''"]
                .iter()
                .any(|n| t.eq_ignore_ascii_case(n))
    }
}

/// Replace every double quote with a single quote.
pub fn escape_content(content: &str) -> String {
    content.replace('"', "'")
}

// ── Store enum ────────────────────────────────────────────────────────────────

/// All available store backends. Same enum-dispatch shape as
/// [`crate::llm::GenerationEngine`].
#[derive(Debug, Clone)]
pub enum MemoryStore {
    Http(http::HttpMemoryStore),
    Dummy(dummy::DummyStore),
}

impl MemoryStore {
    /// Send one record; returns the store's response body.
    pub async fn persist(&self, record: &MemoryRecord) -> Result<String, StoreError> {
        let command = record.to_command();
        match self {
            MemoryStore::Http(s) => s.send(&command).await,
            MemoryStore::Dummy(s) => s.send(&command),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MemoryStore::Http(_) => "http",
            MemoryStore::Dummy(_) => "dummy",
        }
    }
}

/// Factory called at startup: HTTP when enabled, the local dummy otherwise.
pub fn build(config: &MemoryConfig) -> Result<MemoryStore, StoreError> {
    if config.enabled {
        let store = http::HttpMemoryStore::new(config.endpoint.clone(), config.timeout_seconds)?;
        Ok(MemoryStore::Http(store))
    } else {
        Ok(MemoryStore::Dummy(dummy::DummyStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_has_fixed_shape() {
        let r = MemoryRecord::new("330937", "qwen", "The user greets the assistant");
        assert_eq!(
            r.to_command(),
            "insert into memory('uid', 'llm_id', 'content') values \
             ('330937', 'qwen', \"The user greets the assistant\");"
        );
    }

    #[test]
    fn double_quotes_become_single() {
        let r = MemoryRecord::new("330937", "qwen", r#"The user asked about "Rust" and "Go""#);
        let cmd = r.to_command();
        assert!(cmd.ends_with(r#""The user asked about 'Rust' and 'Go'");"#));
        // Only the two delimiters around the content remain.
        assert_eq!(cmd.matches('"').count(), 2);
    }

    #[test]
    fn escaping_is_lossy_for_existing_single_quotes() {
        assert_eq!(escape_content(r#"it's "x""#), escape_content("it's 'x'"));
    }

    #[test]
    fn null_like_detection() {
        for s in ["", "  ", "null", "NULL", "None", "\"\"", "\nnull\n"] {
            assert!(MemoryRecord::new("u", "m", s).is_null_like(), "{s:?}");
        }
        assert!(!MemoryRecord::new("u", "m", "The user is null-safe").is_null_like());
    }

    #[test]
    fn build_picks_backend_from_enabled_flag() {
        let mut cfg = crate::config::Config::test_default().memory;
        assert_eq!(build(&cfg).unwrap().name(), "dummy");
        cfg.enabled = true;
        assert_eq!(build(&cfg).unwrap().name(), "http");
    }

    #[tokio::test]
    async fn disabled_store_does_not_retain_commands() {
        let cfg = crate::config::Config::test_default().memory;
        let store = build(&cfg).unwrap();
        for _ in 0..10 {
            store.persist(&MemoryRecord::new("u", "m", "x")).await.unwrap();
        }
        let MemoryStore::Dummy(local) = store else {
            panic!("expected the local store");
        };
        assert!(local.commands().is_empty());
    }
}
