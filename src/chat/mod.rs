// Streaming assistant chat
// Server-sent events are parsed incrementally and folded into a transcript

pub mod client;
pub mod sse;
pub mod transcript;

pub use client::{CancelToken, ChatClient, ChatError, ChatOutcome};
pub use sse::{ChatEvent, SseEvent, SseParser, ToolCallEvent};
pub use transcript::{BeginError, ChatMessage, ChatTranscript, DisplayMessage, Role, ToolCall};
