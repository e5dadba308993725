//! Chat-memory loop.
//!
//! Each turn runs four phases strictly in order:
//!
//! ```text
//! AwaitingInput → Streaming → Summarizing → Persisting → AwaitingInput …
//! ```
//!
//! 1. read a console line (empty → configured fallback),
//! 2. stream the engine's reply to the console fragment by fragment,
//! 3. ask the engine for a short memory of the *raw input*,
//! 4. send the memory to the store and print its reply.
//!
//! Generation failures end the loop with an error. Store failures follow
//! [`FailurePolicy`]. The loop stops at end of input or when `shutdown`
//! is cancelled; an in-flight turn is abandoned in that case.

pub mod console;
pub mod prompt;

use std::io::IsTerminal;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ChatConfig, FailurePolicy, MemoryConfig};
use crate::error::AppError;
use crate::llm::GenerationEngine;
use crate::memory::{MemoryRecord, MemoryStore};

use console::Console;

/// Whether the loop body executes at all. Chosen by the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Disabled,
}

impl RunMode {
    /// Interactive when stdin is a terminal, or when `force` is set.
    pub fn detect(force: bool) -> Self {
        if force || std::io::stdin().is_terminal() {
            RunMode::Interactive
        } else {
            RunMode::Disabled
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingInput,
    Streaming,
    Summarizing,
    Persisting,
}

/// What happened to a turn's memory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    /// Store accepted it; holds the response body.
    Stored(String),
    /// Null-like summary with `memory.skip_null` set.
    Skipped,
    /// Store failed and the policy is `report`; holds the reason.
    Failed(String),
}

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub id: Uuid,
    /// Effective input (after fallback substitution).
    pub input: String,
    /// Full streamed reply.
    pub response: String,
    /// Summarizer output as persisted.
    pub memory: String,
    pub persisted: Persisted,
}

/// Startup-built context for the loop: settings plus both collaborators.
#[derive(Debug, Clone)]
pub struct ChatLoop {
    chat: ChatConfig,
    memory: MemoryConfig,
    engine: GenerationEngine,
    store: MemoryStore,
}

impl ChatLoop {
    pub fn new(chat: ChatConfig, memory: MemoryConfig, engine: GenerationEngine, store: MemoryStore) -> Self {
        Self { chat, memory, engine, store }
    }

    /// Run turns until end of input or shutdown. Returns the number of
    /// completed turns.
    pub async fn run<R, W>(
        &self,
        mode: RunMode,
        console: &mut Console<R, W>,
        shutdown: &CancellationToken,
    ) -> Result<usize, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if mode == RunMode::Disabled {
            info!("stdin is not interactive: chat loop not started");
            return Ok(0);
        }

        info!(engine = self.engine.name(), store = self.store.name(), "chat loop started");
        let mut completed = 0usize;

        loop {
            let turn = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("shutdown requested: leaving chat loop");
                    break;
                }

                turn = self.next_turn(console) => turn?,
            };

            match turn {
                Some(outcome) => {
                    completed += 1;
                    debug!(turn_id = %outcome.id, completed, "turn finished");
                }
                None => {
                    info!("console input closed");
                    break;
                }
            }
        }

        Ok(completed)
    }

    /// Prompt for a line and run a turn on it. `Ok(None)` at end of input.
    pub async fn next_turn<R, W>(&self, console: &mut Console<R, W>) -> Result<Option<TurnOutcome>, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug!(phase = ?Phase::AwaitingInput, "waiting for input");
        console.write(&self.chat.input_label).await?;
        let Some(line) = console.read_line().await? else {
            return Ok(None);
        };
        self.run_turn(console, &line).await.map(Some)
    }

    /// Run one full turn on an already-read console line.
    pub async fn run_turn<R, W>(&self, console: &mut Console<R, W>, line: &str) -> Result<TurnOutcome, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let id = Uuid::now_v7();
        let input = prompt::effective_input(line, &self.chat.fallback_prompt).to_string();
        debug!(turn_id = %id, fallback = line.is_empty(), input_len = input.len(), "turn started");

        let response = self.stream_response(id, console, &input).await?;
        let memory = self.summarize(id, console, &input).await?;
        let persisted = self.persist(id, console, &memory).await?;

        Ok(TurnOutcome { id, input, response, memory, persisted })
    }

    async fn stream_response<R, W>(&self, id: Uuid, console: &mut Console<R, W>, input: &str) -> Result<String, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug!(turn_id = %id, phase = ?Phase::Streaming, "generating reply");
        let request = prompt::response_request(
            input,
            self.chat.system_prompt.as_deref(),
            self.chat.response_max_tokens,
        );

        let mut stream = self.engine.stream(&request).await?;
        console.write(&self.chat.reply_label).await?;

        let mut accumulated = String::new();
        let mut fragments = 0usize;
        while let Some(fragment) = stream.next_fragment().await? {
            accumulated.push_str(&fragment);
            console.write(&fragment).await?;
            fragments += 1;
        }

        debug!(turn_id = %id, fragments, len = accumulated.len(), "reply complete");
        Ok(accumulated)
    }

    async fn summarize<R, W>(&self, id: Uuid, console: &mut Console<R, W>, input: &str) -> Result<String, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug!(turn_id = %id, phase = ?Phase::Summarizing, "making memory");
        console.write_line("\nMaking memory...").await?;

        let request = prompt::summary_request(input, self.chat.summary_max_tokens);
        let memory = self.engine.complete(&request).await?;

        console.write_line("Memory made...").await?;
        debug!(turn_id = %id, memory = %memory, "memory made");
        Ok(memory)
    }

    async fn persist<R, W>(&self, id: Uuid, console: &mut Console<R, W>, memory: &str) -> Result<Persisted, AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        debug!(turn_id = %id, phase = ?Phase::Persisting, "persisting memory");
        let record = MemoryRecord::new(&self.memory.uid, &self.memory.llm_id, memory);

        if self.memory.skip_null && record.is_null_like() {
            info!(turn_id = %id, "summary is null-like: not persisted");
            console.write_line("\n[memory] nothing worth keeping").await?;
            return Ok(Persisted::Skipped);
        }

        match self.store.persist(&record).await {
            Ok(reply) => {
                console.write_line(&format!("\n{reply}")).await?;
                Ok(Persisted::Stored(reply))
            }
            Err(e) => match self.memory.on_failure {
                FailurePolicy::Report => {
                    warn!(turn_id = %id, error = %e, "memory not persisted: continuing");
                    console.write_line(&format!("\n[memory] not saved: {e}")).await?;
                    Ok(Persisted::Failed(e.to_string()))
                }
                FailurePolicy::Fatal => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::memory::dummy::DummyStore;

    fn chat_loop(engine: DummyProvider, store: DummyStore) -> ChatLoop {
        let cfg = Config::test_default();
        ChatLoop::new(cfg.chat, cfg.memory, GenerationEngine::Dummy(engine), MemoryStore::Dummy(store))
    }

    fn console(input: &'static str) -> Console<&'static [u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    #[tokio::test]
    async fn disabled_mode_never_reads_input() {
        let engine = DummyProvider::new();
        let l = chat_loop(engine.clone(), DummyStore::recording());
        let mut c = console("Hello\n");
        let n = l.run(RunMode::Disabled, &mut c, &CancellationToken::new()).await.unwrap();
        assert_eq!(n, 0);
        assert!(engine.requests().is_empty());
        let (_, out) = c.into_parts();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn runs_until_end_of_input() {
        let store = DummyStore::recording();
        let l = chat_loop(DummyProvider::scripted(["ok"], "The user tests"), store.clone());
        let mut c = console("one\ntwo\n");
        let n = l.run(RunMode::Interactive, &mut c, &CancellationToken::new()).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.commands().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_turn() {
        let engine = DummyProvider::new();
        let l = chat_loop(engine.clone(), DummyStore::recording());
        let token = CancellationToken::new();
        token.cancel();
        let mut c = console("Hello\n");
        let n = l.run(RunMode::Interactive, &mut c, &token).await.unwrap();
        assert_eq!(n, 0);
        assert!(engine.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_stream_abandons_turn() {
        let engine = DummyProvider::stalled(["The "], "The user asks");
        let store = DummyStore::recording();
        let l = chat_loop(engine.clone(), store.clone());
        let token = CancellationToken::new();
        let mut c = console("What is 2+2?\n");

        let canceller = token.clone();
        let (result, ()) = tokio::join!(l.run(RunMode::Interactive, &mut c, &token), async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            canceller.cancel();
        });

        assert_eq!(result.unwrap(), 0);
        // Only the streaming request went out; no summary was asked for.
        assert_eq!(engine.requests().len(), 1);
        assert!(store.commands().is_empty());
        let (_, out) = c.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("The "), "{out:?}");
        assert!(!out.contains("Making memory"));
    }

    #[tokio::test]
    async fn console_output_follows_turn_order() {
        let l = chat_loop(DummyProvider::scripted(["Hi", "!"], "The user greets"), DummyStore::recording());
        let mut c = console("");
        l.run_turn(&mut c, "hey").await.unwrap();
        let (_, out) = c.into_parts();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Hi!\nMaking memory...\nMemory made...\n\nstored (local)\n"
        );
    }

    #[tokio::test]
    async fn skip_null_does_not_touch_store() {
        let store = DummyStore::recording();
        let cfg = Config::test_default();
        let mut memory = cfg.memory;
        memory.skip_null = true;
        let l = ChatLoop::new(
            cfg.chat,
            memory,
            GenerationEngine::Dummy(DummyProvider::scripted(["x"], "null")),
            MemoryStore::Dummy(store.clone()),
        );
        let mut c = console("");
        let outcome = l.run_turn(&mut c, "asdf").await.unwrap();
        assert_eq!(outcome.persisted, Persisted::Skipped);
        assert!(store.commands().is_empty());
    }

    #[tokio::test]
    async fn null_summary_is_persisted_by_default() {
        let store = DummyStore::recording();
        let l = chat_loop(DummyProvider::scripted(["x"], "null"), store.clone());
        let mut c = console("");
        let outcome = l.run_turn(&mut c, "asdf").await.unwrap();
        assert!(matches!(outcome.persisted, Persisted::Stored(_)));
        assert_eq!(store.commands().len(), 1);
    }
}
