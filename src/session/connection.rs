use std::fmt;

use url::Url;

use crate::error::{SessionError, SessionResult};
use crate::protocol::ClientFrame;
use super::transport::{ChannelEvent, ConnectionId, Connector, EventSender, Transport};

/// Lifecycle of a single connection instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Closed and errored connections never come back; a new instance is needed
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    /// Connecting or open: the instance still holds a live channel
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying a channel event to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// connecting -> open
    Opened,
    /// An inbound payload on an open connection
    Message(String),
    /// The remote went away while we still wanted the connection
    Lost,
    /// A close we asked for has completed
    Closed,
    /// Transport failure while connecting or open
    Failed(String),
    /// The event does not apply in the current state
    Ignored,
}

/// One duplex channel instance and its state machine.
///
/// `idle -> connecting -> open -> {closing -> closed, errored}`. Terminal
/// states are final for the instance; reconnecting means a new `Connection`.
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
    transport: Option<Box<dyn Transport>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            state: ConnectionState::Idle,
            transport: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// idle -> connecting. A connector that fails immediately leaves the
    /// instance errored.
    pub fn connect(
        &mut self,
        connector: &mut dyn Connector,
        url: &Url,
        events: EventSender,
    ) -> SessionResult<()> {
        if self.state != ConnectionState::Idle {
            return Err(SessionError::Transport(format!(
                "connection {} already used ({})",
                self.id, self.state
            )));
        }

        match connector.open(url, self.id, events) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = ConnectionState::Connecting;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Errored;
                Err(e)
            }
        }
    }

    /// Single entry point for everything the channel reports
    pub fn apply(&mut self, event: ChannelEvent) -> Transition {
        use ConnectionState::*;

        match (self.state, event) {
            (Connecting, ChannelEvent::Opened) => {
                self.state = Open;
                Transition::Opened
            }
            (Open, ChannelEvent::Message(payload)) => Transition::Message(payload),
            (Connecting | Open, ChannelEvent::Closed) => {
                self.release(Closed);
                Transition::Lost
            }
            (Closing, ChannelEvent::Closed | ChannelEvent::Error(_)) => {
                self.release(Closed);
                Transition::Closed
            }
            (Connecting | Open, ChannelEvent::Error(message)) => {
                self.release(Errored);
                Transition::Failed(message)
            }
            _ => Transition::Ignored,
        }
    }

    /// Send one frame. Fails unless the connection is open.
    pub fn send(&mut self, frame: &ClientFrame) -> SessionResult<()> {
        if self.state != ConnectionState::Open {
            return Err(SessionError::NotOpen(self.state));
        }
        let Some(transport) = self.transport.as_mut() else {
            return Err(SessionError::NotOpen(self.state));
        };

        if let Err(e) = transport.send(frame.encode()) {
            self.release(ConnectionState::Errored);
            return Err(e);
        }
        Ok(())
    }

    /// open|connecting -> closing. Returns false when there was nothing to
    /// close, which makes repeated calls no-ops.
    pub fn close(&mut self) -> bool {
        if !self.state.is_live() {
            return false;
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.state = ConnectionState::Closing;
        true
    }

    fn release(&mut self, state: ConnectionState) {
        self.transport = None;
        self.state = state;
    }
}
