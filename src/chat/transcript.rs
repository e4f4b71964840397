use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sse::{ChatEvent, ToolCallEvent};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Function part of a tool call, as the chat API expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl From<ToolCallEvent> for ToolCall {
    fn from(event: ToolCallEvent) -> Self {
        Self {
            id: event.id,
            kind: "function".to_string(),
            function: FunctionCall {
                name: event.name,
                arguments: event.arguments,
            },
        }
    }
}

/// Message in the request history sent with every chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Result of a tool the assistant invoked
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub name: String,
    pub result: String,
}

/// A message as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    /// Still receiving content
    pub loading: bool,
    pub timestamp: DateTime<Local>,
}

/// Why a new turn could not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginError {
    /// A previous answer is still streaming
    Busy,
    EmptyMessage,
}

/// Chat state for one conversation: what is displayed and what is sent.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    messages: Vec<DisplayMessage>,
    history: Vec<ChatMessage>,
    streaming: bool,
    next_id: u64,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Start a turn: records the user message and an empty, loading
    /// assistant reply. Returns the history to send.
    pub fn begin(&mut self, content: &str) -> Result<Vec<ChatMessage>, BeginError> {
        if self.streaming {
            return Err(BeginError::Busy);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(BeginError::EmptyMessage);
        }

        self.push_display(Role::User, content, false);
        self.push_display(Role::Assistant, "", true);
        self.history.push(ChatMessage::new(Role::User, content));
        self.streaming = true;
        Ok(self.history.clone())
    }

    /// Apply one stream event to the assistant reply in progress
    pub fn apply(&mut self, event: &ChatEvent) {
        let Some(reply) = self.current_reply() else {
            return;
        };

        match event {
            ChatEvent::Content(text) => reply.content.push_str(text),
            ChatEvent::ToolCall(call) => reply.tool_calls.push(ToolCall::from(call.clone())),
            ChatEvent::ToolResult { name, result, .. } => {
                let result = match result {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                reply.tool_results.push(ToolResult { name: name.clone(), result });
            }
            ChatEvent::Error(message) => {
                if reply.content.is_empty() {
                    reply.content = format!("error: {}", message);
                }
                reply.loading = false;
            }
            ChatEvent::Done | ChatEvent::Unrecognized(_) => {}
        }
    }

    /// The stream ended normally; the reply joins the history
    pub fn finish(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Some(reply) = self.current_reply() {
            reply.loading = false;
            let content = reply.content.clone();
            self.history.push(ChatMessage::new(Role::Assistant, content));
        }
    }

    /// The request failed outright
    pub fn fail(&mut self, error: &str) {
        self.streaming = false;
        if let Some(reply) = self.current_reply() {
            reply.content = format!("connection failed: {}", error);
            reply.loading = false;
        }
    }

    /// The user stopped the stream; partial content is kept
    pub fn stop(&mut self) {
        self.streaming = false;
        if let Some(reply) = self.messages.last_mut().filter(|m| m.loading) {
            if reply.content.is_empty() {
                reply.content = "(stopped)".to_string();
            }
            reply.loading = false;
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.history.clear();
        self.streaming = false;
    }

    fn current_reply(&mut self) -> Option<&mut DisplayMessage> {
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }

    fn push_display(&mut self, role: Role, content: &str, loading: bool) {
        self.next_id += 1;
        self.messages.push(DisplayMessage {
            id: self.next_id,
            role,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            loading,
            timestamp: Local::now(),
        });
    }
}
