//! Request construction for the two generation passes of a turn.

use crate::llm::{ChatMessage, ChatRequest};

/// System instruction for the memory pass. The raw user input is appended
/// directly after the final line.
pub const SUMMARY_INSTRUCTION: &str = "\
You keep a running memory of what the user is trying to accomplish, so that \
later answers stay coherent and consistent with earlier tasks.
Write one memory from the user's prompt below, following these rules:
1. Use at most 10 tokens to describe the memory.
2. Begin the memory with `The user`.
3. If nothing useful can be inferred, answer with the single word null.

The user's prompt follows:
";

/// The text actually sent for a line of console input: the line itself, or
/// `fallback` when the line is empty.
pub fn effective_input<'a>(line: &'a str, fallback: &'a str) -> &'a str {
    if line.is_empty() { fallback } else { line }
}

/// Streamed reply request: optional persona, then the user message.
pub fn response_request(input: &str, system_prompt: Option<&str>, max_tokens: u32) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(input));
    ChatRequest::new(messages, max_tokens)
}

/// Memory request: a single system message carrying the instruction and the
/// raw user input. The generated reply is never part of it.
pub fn summary_request(raw_input: &str, max_tokens: u32) -> ChatRequest {
    let content = format!("{SUMMARY_INSTRUCTION}{raw_input}");
    ChatRequest::new(vec![ChatMessage::system(content)], max_tokens)
}
