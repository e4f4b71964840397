use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::error::{SessionError, SessionResult};

/// Identifies one connection instance. A reconnect always gets a fresh id,
/// so events from a torn-down instance can be recognised and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on the duplex channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

/// A channel event tagged with the connection instance it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub id: ConnectionId,
    pub event: ChannelEvent,
}

pub type EventSender = mpsc::UnboundedSender<ConnectionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// Create the channel every connection instance reports into
pub fn connection_events() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Outbound half of an open duplex channel
pub trait Transport: Send {
    /// Hand one text message to the channel. Fails if the channel is gone.
    fn send(&mut self, payload: String) -> SessionResult<()>;
    /// Begin a graceful close. The channel reports `Closed` when done.
    fn close(&mut self);
}

/// Opens duplex channels. Inbound traffic is reported through `events`.
pub trait Connector {
    fn open(
        &mut self,
        url: &Url,
        id: ConnectionId,
        events: EventSender,
    ) -> SessionResult<Box<dyn Transport>>;
}

enum Outgoing {
    Text(String),
    Close,
}

/// WebSocket transport running on the tokio runtime
pub struct WebSocketTransport {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl Transport for WebSocketTransport {
    fn send(&mut self, payload: String) -> SessionResult<()> {
        self.tx
            .send(Outgoing::Text(payload))
            .map_err(|_| SessionError::Transport("websocket task has stopped".to_string()))
    }

    fn close(&mut self) {
        // The task may already be gone; closing twice is harmless
        let _ = self.tx.send(Outgoing::Close);
    }
}

/// Connects over `ws://`/`wss://` using tokio-tungstenite.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(
        &mut self,
        url: &Url,
        id: ConnectionId,
        events: EventSender,
    ) -> SessionResult<Box<dyn Transport>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let url = url.clone();
        tokio::runtime::Handle::try_current()
            .map_err(|e| SessionError::Transport(e.to_string()))?
            .spawn(run_websocket(url, id, rx, events));
        Ok(Box::new(WebSocketTransport { tx }))
    }
}

async fn run_websocket(
    url: Url,
    id: ConnectionId,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: EventSender,
) {
    let emit = |event: ChannelEvent| {
        // The controller may have been dropped; nothing left to tell
        let _ = events.send(ConnectionEvent { id, event });
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            tracing::error!(connection = %id, error = %e, "websocket connect failed");
            emit(ChannelEvent::Error(e.to_string()));
            return;
        }
    };
    tracing::info!(connection = %id, %url, "websocket open");
    emit(ChannelEvent::Opened);

    let (mut sink, mut source) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            out = outgoing.recv(), if !closing => {
                match out {
                    Some(Outgoing::Text(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            emit(ChannelEvent::Error(e.to_string()));
                            return;
                        }
                    }
                    // Close requested, or the transport handle was dropped
                    Some(Outgoing::Close) | None => {
                        closing = true;
                        if sink.send(Message::Close(None)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => emit(ChannelEvent::Message(text)),
                    Some(Ok(Message::Binary(bytes))) => {
                        emit(ChannelEvent::Message(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        if closing {
                            break;
                        }
                        emit(ChannelEvent::Error(e.to_string()));
                        return;
                    }
                }
            }
        }
    }

    tracing::info!(connection = %id, "websocket closed");
    emit(ChannelEvent::Closed);
}
