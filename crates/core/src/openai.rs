//! OpenAI-compatible chat completions over server-sent events.
//!
//! A turn is one `POST {base}/chat/completions` with `stream: true`. The response body is a
//! sequence of `data: {json}` lines terminated by `data: [DONE]`; each chunk is resolved
//! into a [`Fragment`].

use crate::config::AgentConfig;
use crate::constants::LLM_CONNECT_TIMEOUT_SECS;
use crate::llm::{Fragment, FragmentStream, ModelClient};
use crate::turn::PipelineTurn;
use crate::{AgentError, AgentResult};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

const DATA_FIELD: &str = "data:";
const DONE_MARKER: &str = "[DONE]";
/// Longest pending line accepted before the stream is treated as broken.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Streaming client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// Create a client from resolved configuration.
    ///
    /// Only the connection phase is time-bounded; a turn may stream for as long as the model
    /// keeps producing output.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(LLM_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AgentError::Configuration(format!("failed to build model client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.llm_base_url()),
            api_key: config.require_credential().ok().map(str::to_string),
            model: config.model_name().to_string(),
        })
    }
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl ModelClient for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream(&self, turn: &PipelineTurn) -> AgentResult<FragmentStream> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("model credential is not configured".into()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &turn.system,
                },
                ChatMessage {
                    role: "user",
                    content: &turn.task,
                },
            ],
            stream: true,
        };

        tracing::debug!(role = %turn.role, model = %self.model, "starting model turn");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(error_message(status, &body)));
        }

        Ok(decode_stream(response.bytes_stream()))
    }
}

/// Extract `error.message` from an error body, falling back to the status and raw text.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}: {}", body.trim()))
}

// ============================================================================
// SSE DECODING
// ============================================================================

/// Event decoded from one `data:` line.
///
/// `Failed` carries the message of an undecodable line or an `error` chunk. It is always the
/// last event a decoder produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Fragment(Fragment),
    Done,
    Failed(String),
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkMessage>,
    #[serde(default)]
    message: Option<ChunkMessage>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: Option<String>,
}

/// Incremental line decoder for an event-stream body.
///
/// Network chunks may split a line (and a multi-byte character) anywhere, so bytes are
/// buffered until a newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a body chunk and return the events of every line it completes.
    ///
    /// Events decoded before a bad line are kept; the bad line becomes a trailing
    /// [`SseEvent::Failed`] and the decoder drops whatever follows it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            match parse_line(&line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(message) => {
                    self.buffer.clear();
                    events.push(SseEvent::Failed(message));
                    return events;
                }
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            events.push(SseEvent::Failed(format!(
                "stream line exceeds {MAX_LINE_BYTES} bytes"
            )));
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest).unwrap_or_else(|message| Some(SseEvent::Failed(message)))
    }
}

fn parse_line(raw: &[u8]) -> Result<Option<SseEvent>, String> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| format!("stream is not valid UTF-8: {e}"))?
        .trim_end_matches(['\r', '\n']);

    // Blank lines end events; `:` lines are comments; other fields carry nothing we use.
    let Some(data) = line.strip_prefix(DATA_FIELD) else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == DONE_MARKER {
        return Ok(Some(SseEvent::Done));
    }

    let mut deserializer = serde_json::Deserializer::from_str(data);
    let chunk: ChatChunk = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        format!(
            "undecodable stream chunk at {}: {}",
            if path.is_empty() { "<root>" } else { path.as_str() },
            err.into_inner()
        )
    })?;

    if let Some(error) = chunk.error {
        return Err(error.message.unwrap_or_else(|| "model reported an error".into()));
    }

    Ok(Some(SseEvent::Fragment(resolve_fragment(chunk))))
}

fn resolve_fragment(chunk: ChatChunk) -> Fragment {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Fragment::Empty;
    };

    let delta = choice.delta.and_then(|d| d.content).filter(|t| !t.is_empty());
    let content = choice.message.and_then(|m| m.content).filter(|t| !t.is_empty());

    match (delta, content) {
        (Some(text), _) => Fragment::Delta(text),
        (None, Some(text)) => Fragment::Content(text),
        (None, None) => Fragment::Empty,
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<AgentResult<Fragment>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            match event {
                SseEvent::Fragment(fragment) => self.pending.push_back(Ok(fragment)),
                SseEvent::Done => {
                    self.finished = true;
                    break;
                }
                SseEvent::Failed(message) => {
                    self.pending.push_back(Err(AgentError::ModelInvocation(message)));
                    self.finished = true;
                    break;
                }
            }
        }
    }
}

/// Turn a raw event-stream body into a fragment stream.
///
/// The stream ends at `[DONE]` or when the body ends. The first decode or transport error is
/// yielded once, after every fragment decoded ahead of it, and ends the stream.
pub fn decode_stream<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.enqueue(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    let err = AgentError::ModelInvocation(format!("stream interrupted: {err}"));
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    let event = state.decoder.finish();
                    if event.is_none() {
                        tracing::debug!("model stream ended without a done marker");
                    }
                    state.enqueue(event);
                }
            }
        }
    })
    .boxed()
}
