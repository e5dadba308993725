//! Server-sent event decoding for streamed chat completions.
//!
//! Event framing comes from `eventsource-stream` over the response's byte
//! stream. This module only maps each event's `data` payload onto text
//! fragments, the `[DONE]` terminator, or an error reported in-band.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Deserialize;
use tracing::{error, trace};

use super::EngineError;

/// A decoded event relevant to the chat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty `choices[0].delta.content` piece.
    Delta(String),
    /// The `data: [DONE]` terminator.
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamFailure>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// In-band failure, e.g. `data: {"error":{"message":"CUDA out of memory","code":500}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamFailure {
    Detailed {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<serde_json::Value>,
    },
    Plain(String),
    Other(serde_json::Value),
}

impl StreamFailure {
    fn describe(self) -> String {
        match self {
            StreamFailure::Detailed { message, code } => {
                let message = message.unwrap_or_else(|| "error reported during streaming".into());
                match code {
                    Some(serde_json::Value::String(s)) => format!("{message} [code={s}]"),
                    Some(other) => format!("{message} [code={other}]"),
                    None => message,
                }
            }
            StreamFailure::Plain(message) => message,
            StreamFailure::Other(value) => value.to_string(),
        }
    }
}

/// Map one event's `data` field to an [`SseEvent`].
///
/// Blank payloads and chunks without content (role-only deltas, usage
/// trailers) yield `Ok(None)`. An `error` object in the payload is an
/// [`EngineError::Stream`], as is any payload that is not valid JSON.
pub fn decode_data(data: &str) -> Result<Option<SseEvent>, EngineError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| EngineError::Stream(format!("bad event payload: {e}")))?;
    trace!(data, "sse event");

    if let Some(failure) = chunk.error {
        let message = failure.describe();
        error!(%message, "server reported an error mid-stream");
        return Err(EngineError::Stream(format!("server reported error: {message}")));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty())
        .map(SseEvent::Delta))
}

type EventSource = BoxStream<
    'static,
    Result<eventsource_stream::Event, eventsource_stream::EventStreamError<reqwest::Error>>,
>;

/// Live fragment stream over an SSE response body.
pub struct SseStream {
    events: EventSource,
    done: bool,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream").field("done", &self.done).finish_non_exhaustive()
    }
}

impl SseStream {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            events: response.bytes_stream().eventsource().boxed(),
            done: false,
        }
    }

    pub async fn next_fragment(&mut self) -> Result<Option<String>, EngineError> {
        while !self.done {
            let Some(event) = self.events.next().await else {
                // Connection closed without `[DONE]`: treat as end.
                self.done = true;
                break;
            };
            let event = event.map_err(|e| EngineError::Stream(format!("event stream failed: {e}")))?;
            match decode_data(&event.data)? {
                Some(SseEvent::Delta(text)) => return Ok(Some(text)),
                Some(SseEvent::Done) => self.done = true,
                None => {}
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_and_done_decode() {
        let data = serde_json::json!({ "choices": [{ "delta": { "content": "The " } }] }).to_string();
        assert_eq!(decode_data(&data).unwrap(), Some(SseEvent::Delta("The ".into())));
        assert_eq!(decode_data("[DONE]").unwrap(), Some(SseEvent::Done));
    }

    #[test]
    fn role_only_and_empty_chunks_are_skipped() {
        assert_eq!(decode_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(), None);
        assert_eq!(decode_data(r#"{"choices":[]}"#).unwrap(), None);
        assert_eq!(decode_data(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap(), None);
        assert_eq!(decode_data("").unwrap(), None);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let err = decode_data("{not json").unwrap_err();
        assert!(matches!(err, EngineError::Stream(_)));
    }

    #[test]
    fn error_object_is_an_error() {
        let err = decode_data(r#"{"error":{"message":"CUDA out of memory","code":500}}"#).unwrap_err();
        match err {
            EngineError::Stream(msg) => {
                assert!(msg.contains("CUDA out of memory"));
                assert!(msg.contains("code=500"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn plain_string_error_is_an_error() {
        let err = decode_data(r#"{"error":"context length exceeded"}"#).unwrap_err();
        assert!(err.to_string().contains("context length exceeded"));
    }
}
