use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use super::sse::{ChatEvent, SseParser};
use super::transcript::ChatMessage;

/// How a stream ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// `done` event or end of body
    Completed,
    /// Cancelled through the [`CancelToken`]
    Stopped,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("network request failed: {0}")]
    Network(String),
    #[error("failed to read response stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared cancellation flag for an in-flight stream
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Blocking client for the assistant's streaming chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    agent: ureq::Agent,
    token: Option<String>,
}

const READ_CHUNK: usize = 4096;

impl ChatClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            token,
        }
    }

    /// POST the history to `url` and deliver events as they arrive
    pub fn stream(
        &self,
        url: &Url,
        history: &[ChatMessage],
        cancel: &CancelToken,
        mut on_event: impl FnMut(ChatEvent),
    ) -> Result<ChatOutcome, ChatError> {
        let mut request = self
            .agent
            .post(url.as_str())
            .set("Content-Type", "application/json")
            .set("Accept", "text/event-stream");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        tracing::debug!(%url, messages = history.len(), "starting chat stream");
        let response = match request.send_json(json!({ "messages": history })) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| format!("HTTP {}", status));
                return Err(ChatError::Http { status, message });
            }
            Err(e) => return Err(ChatError::Network(e.to_string())),
        };

        read_stream(response.into_reader(), cancel, &mut on_event)
    }
}

/// Drive an SSE body to completion, checking for cancellation between reads
pub fn read_stream(
    mut body: impl Read,
    cancel: &CancelToken,
    on_event: &mut impl FnMut(ChatEvent),
) -> Result<ChatOutcome, ChatError> {
    let mut parser = SseParser::new();
    let mut chunk = [0u8; READ_CHUNK];
    // Bytes of a UTF-8 sequence split across reads
    let mut carry: Vec<u8> = Vec::new();

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("chat stream stopped");
            return Ok(ChatOutcome::Stopped);
        }

        let read = body.read(&mut chunk);
        // A stop that lands while the read was blocked wins over whatever it returned
        if cancel.is_cancelled() {
            tracing::debug!("chat stream stopped during read");
            return Ok(ChatOutcome::Stopped);
        }
        let n = read?;
        if n == 0 {
            return Ok(ChatOutcome::Completed);
        }
        carry.extend_from_slice(&chunk[..n]);

        let valid = match std::str::from_utf8(&carry) {
            Ok(text) => text.len(),
            // Invalid bytes get replaced; an incomplete tail waits for the next read
            Err(e) if e.error_len().is_some() => carry.len(),
            Err(e) => e.valid_up_to(),
        };
        let text = String::from_utf8_lossy(&carry[..valid]).into_owned();
        carry.drain(..valid);

        for sse in parser.feed(&text) {
            on_event(ChatEvent::from(sse));
        }
        if parser.is_done() {
            on_event(ChatEvent::Done);
            return Ok(ChatOutcome::Completed);
        }
    }
}
