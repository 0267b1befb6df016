//! OpenAI-compatible chat completions client with streamed responses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::{ChatMessage, ChatOptions, LlmClient};
use crate::config::LlmConfig;
use crate::util::truncate_for_log;

/// Upper bound on non-event body text kept for error reporting.
const MAX_UNPARSED_BYTES: usize = 4096;

/// Receives streamed text as it arrives. Purely informational.
pub trait StreamObserver: Send + Sync {
    fn on_fragment(&self, fragment: &str);

    /// Called once when the response body ends, whether it completed or failed.
    fn on_complete(&self) {}
}

/// Client for any server that speaks the OpenAI chat completions protocol.
pub struct OpenAiCompatClient {
    client: Client,
    config: LlmConfig,
    observer: Option<Arc<dyn StreamObserver>>,
}

impl OpenAiCompatClient {
    /// Create a client whose every request is bounded by `config.timeout_secs`.
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            observer: None,
        })
    }

    /// Surface streamed fragments to `observer` while a response is assembled.
    pub fn with_observer(mut self, observer: Arc<dyn StreamObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Send one streamed request and concatenate every delta in arrival order.
    async fn stream_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            stream: true,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        let result = self.read_stream(response).await;
        if let Some(observer) = &self.observer {
            observer.on_complete();
        }
        result
    }

    async fn read_stream(&self, response: reqwest::Response) -> Result<String, LlmError> {
        let mut byte_stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut collected = String::new();
        let mut done = false;

        'read: while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(LlmError::from_reqwest)?;
            for event in decoder.push(&chunk) {
                if self.apply(event?, &mut collected) {
                    done = true;
                    break 'read;
                }
            }
        }
        if !done {
            if let Some(event) = decoder.finish() {
                self.apply(event?, &mut collected);
            }
        }

        // A 200 without a single `data:` line is a plain error body or a
        // server that ignored `stream: true`.
        if decoder.events == 0 {
            return Err(decoder.non_sse_error());
        }
        Ok(collected)
    }

    /// Returns true once the stream signalled completion.
    fn apply(&self, event: StreamEvent, collected: &mut String) -> bool {
        match event {
            StreamEvent::Delta(text) => {
                if !text.is_empty() {
                    if let Some(observer) = &self.observer {
                        observer.on_fragment(&text);
                    }
                    collected.push_str(&text);
                }
                false
            }
            StreamEvent::Done => true,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn think(&self, messages: &[ChatMessage], options: &ChatOptions) -> Option<String> {
        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            temperature = ?options.temperature,
            "Sending streamed chat completion request"
        );

        match self.stream_completion(messages, options).await {
            Ok(text) => {
                tracing::debug!(chars = text.len(), "Model response assembled");
                Some(text)
            }
            Err(e) => {
                tracing::error!(model = %self.config.model, "Model call failed: {}", e);
                None
            }
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    stream: bool,
}

/// One `data:` payload of the stream.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    Delta(String),
    Done,
}

/// Splits a byte stream into server-sent-event lines.
///
/// Bytes are buffered until a full line arrives, so neither lines nor UTF-8
/// sequences split across network chunks are mangled.
///
/// Lines that are not `data:` events are kept (up to a bound) so a body that
/// turns out not to be a stream can still be reported.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    /// Number of `data:` lines seen so far.
    events: usize,
    unparsed: String,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamEvent, LlmError>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.decode_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Handle a final line that was not newline-terminated.
    fn finish(&mut self) -> Option<Result<StreamEvent, LlmError>> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.buffer);
        self.decode_line(&String::from_utf8_lossy(&tail))
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamEvent, LlmError>> {
        match parse_sse_line(line) {
            Some(event) => {
                self.events += 1;
                Some(event)
            }
            None => {
                if !line.starts_with(':') && self.unparsed.len() < MAX_UNPARSED_BYTES {
                    self.unparsed.push_str(line);
                }
                None
            }
        }
    }

    /// Describe a body that produced no events.
    ///
    /// A JSON body with an `error` field yields the provider's message.
    fn non_sse_error(&self) -> LlmError {
        let body = self.unparsed.trim();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(error) = value.get("error") {
                let message = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return LlmError::parse_error(format!("Provider returned an error: {}", message));
            }
        }
        LlmError::parse_error(format!(
            "Response was not an SSE stream: {}",
            truncate_for_log(body, 200)
        ))
    }
}

fn parse_sse_line(line: &str) -> Option<Result<StreamEvent, LlmError>> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(Ok(StreamEvent::Done));
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(LlmError::parse_error(format!(
                "Invalid stream chunk: {}, data: {}",
                e, data
            ))))
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(LlmError::parse_error(format!(
            "Provider reported an error mid-stream: {}",
            error
        ))));
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();
    Some(Ok(StreamEvent::Delta(text)))
}
