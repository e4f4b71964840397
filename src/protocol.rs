use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Frame sent from the terminal client to the remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// A single keystroke forwarded for remote echo
    Input(String),
    /// A completed line, submitted on Enter
    Command(String),
    /// Out-of-band interrupt (Ctrl+C)
    Interrupt,
    /// Switch the namespace kubectl runs against
    ChangeNamespace(String),
    /// Pasted text, delivered in one frame
    QuickCommand(String),
}

/// Event received from the remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Text to append to the terminal
    Output(String),
    /// Error text, rendered distinctly
    Error(String),
    /// The previous command finished; a prompt should be shown
    CommandResult,
    /// Wipe the terminal
    Clear,
    /// The remote switched namespaces
    NamespaceChanged(String),
    /// A well-formed frame with a type this client does not know
    Unrecognized(String),
}

/// An inbound payload that is not a protocol frame.
///
/// The raw payload is kept so it can be shown as plain output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("undecodable frame: {reason}")]
pub struct DecodeFailure {
    pub raw: String,
    pub reason: String,
}

/// On-the-wire shape shared by both directions: `{"type": ..., "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl WireFrame {
    fn new(kind: &str, data: Option<&str>) -> Self {
        Self {
            kind: kind.to_string(),
            data: data.map(|d| Value::String(d.to_string())),
        }
    }

    fn to_json(&self) -> String {
        // A struct of a String and an optional JSON value always serializes
        serde_json::to_string(self).unwrap_or_default()
    }

    fn parse(payload: &str) -> Result<Self, DecodeFailure> {
        serde_json::from_str(payload).map_err(|e| DecodeFailure {
            raw: payload.to_string(),
            reason: e.to_string(),
        })
    }

    /// Data as text. Missing or null data is empty; non-string JSON is kept verbatim.
    fn text(&self) -> String {
        match &self.data {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl ClientFrame {
    /// Wire name of this frame's type
    pub fn kind(&self) -> &'static str {
        match self {
            ClientFrame::Input(_) => "input",
            ClientFrame::Command(_) => "command",
            ClientFrame::Interrupt => "interrupt",
            ClientFrame::ChangeNamespace(_) => "change_namespace",
            ClientFrame::QuickCommand(_) => "quick_command",
        }
    }

    /// Encode into a JSON text message. Never fails.
    pub fn encode(&self) -> String {
        let data = match self {
            ClientFrame::Input(d)
            | ClientFrame::Command(d)
            | ClientFrame::ChangeNamespace(d)
            | ClientFrame::QuickCommand(d) => d.as_str(),
            ClientFrame::Interrupt => "",
        };
        WireFrame::new(self.kind(), Some(data)).to_json()
    }

    /// Decode a client frame. Used by servers and test doubles.
    pub fn decode(payload: &str) -> Result<Self, DecodeFailure> {
        let frame = WireFrame::parse(payload)?;
        let data = frame.text();
        match frame.kind.as_str() {
            "input" => Ok(ClientFrame::Input(data)),
            "command" => Ok(ClientFrame::Command(data)),
            "interrupt" => Ok(ClientFrame::Interrupt),
            "change_namespace" => Ok(ClientFrame::ChangeNamespace(data)),
            "quick_command" => Ok(ClientFrame::QuickCommand(data)),
            other => Err(DecodeFailure {
                raw: payload.to_string(),
                reason: format!("unknown client frame type '{}'", other),
            }),
        }
    }
}

impl ServerEvent {
    /// Wire name of this event's type
    pub fn kind(&self) -> &str {
        match self {
            ServerEvent::Output(_) => "output",
            ServerEvent::Error(_) => "error",
            ServerEvent::CommandResult => "command_result",
            ServerEvent::Clear => "clear",
            ServerEvent::NamespaceChanged(_) => "namespace_changed",
            ServerEvent::Unrecognized(kind) => kind.as_str(),
        }
    }

    /// Encode into a JSON text message
    pub fn encode(&self) -> String {
        let data = match self {
            ServerEvent::Output(d) | ServerEvent::Error(d) | ServerEvent::NamespaceChanged(d) => {
                Some(d.as_str())
            }
            ServerEvent::CommandResult | ServerEvent::Clear | ServerEvent::Unrecognized(_) => None,
        };
        WireFrame::new(self.kind(), data).to_json()
    }

    /// Decode an inbound message.
    ///
    /// Anything that is not a JSON object with a string `type` yields a
    /// [`DecodeFailure`] holding the raw payload.
    pub fn decode(payload: &str) -> Result<Self, DecodeFailure> {
        let frame = WireFrame::parse(payload)?;
        let event = match frame.kind.as_str() {
            "output" => ServerEvent::Output(frame.text()),
            "error" => ServerEvent::Error(frame.text()),
            "command_result" => ServerEvent::CommandResult,
            "clear" => ServerEvent::Clear,
            "namespace_changed" => ServerEvent::NamespaceChanged(frame.text()),
            other => ServerEvent::Unrecognized(other.to_string()),
        };
        Ok(event)
    }
}
