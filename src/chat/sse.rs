use serde::Deserialize;
use serde_json::Value;

/// Event name that ends a chat stream
pub const DONE_EVENT: &str = "done";

/// One `event:`/`data:` pair from a server-sent event stream
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: String,
    /// JSON when the data line parsed as JSON, otherwise the raw string
    pub data: Value,
}

/// Incremental server-sent events parser.
///
/// Bytes may be split anywhere, including inside a line or between an
/// `event:` line and its `data:` line.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    pending_event: String,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `done` event has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a chunk of the body, returning every event it completes.
    /// Nothing is returned once the stream is done.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        self.buffer.push_str(chunk);

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(name) = line.strip_prefix("event:") {
                self.pending_event = name.trim().to_string();
            } else if let Some(data) = line.strip_prefix("data:") {
                let data = data.strip_prefix(' ').unwrap_or(data);
                let event = std::mem::take(&mut self.pending_event);
                if event == DONE_EVENT {
                    self.done = true;
                    self.buffer.clear();
                    break;
                }
                let data = serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_string()));
                events.push(SseEvent { event, data });
            }
        }
        events
    }
}

/// A tool invocation announced by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolCallEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Typed chat stream event
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// An increment of assistant text
    Content(String),
    ToolCall(ToolCallEvent),
    ToolResult { id: String, name: String, result: Value },
    Error(String),
    Done,
    /// Unknown event name or malformed payload
    Unrecognized(SseEvent),
}

impl From<SseEvent> for ChatEvent {
    fn from(sse: SseEvent) -> Self {
        let field = |name: &str| sse.data.get(name).and_then(Value::as_str).map(str::to_string);

        match sse.event.as_str() {
            "content" => match field("content") {
                Some(content) => ChatEvent::Content(content),
                None => ChatEvent::Unrecognized(sse),
            },
            "tool_call" => match serde_json::from_value::<ToolCallEvent>(sse.data.clone()) {
                Ok(call) => ChatEvent::ToolCall(call),
                Err(_) => ChatEvent::Unrecognized(sse),
            },
            "tool_result" => ChatEvent::ToolResult {
                id: field("id").unwrap_or_default(),
                name: field("name").unwrap_or_default(),
                result: sse.data.get("result").cloned().unwrap_or(Value::Null),
            },
            "error" => {
                let message = field("error")
                    .or_else(|| sse.data.as_str().map(str::to_string))
                    .unwrap_or_else(|| sse.data.to_string());
                ChatEvent::Error(message)
            }
            DONE_EVENT => ChatEvent::Done,
            _ => ChatEvent::Unrecognized(sse),
        }
    }
}
