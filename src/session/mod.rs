// Interactive kubectl terminal session
// Line buffer and frame codec feed the controller, which drives one
// connection instance at a time over a websocket transport

pub mod connection;
pub mod controller;
pub mod endpoint;
pub mod line_buffer;
pub mod transport;

pub use connection::{Connection, ConnectionState, Transition};
pub use controller::{ResizeOutcome, Session, SessionController, FIT_RETRY_DELAY};
pub use endpoint::Endpoint;
pub use line_buffer::{KeyClass, LineBuffer, LineEdit};
pub use transport::{
    connection_events, ChannelEvent, ConnectionEvent, ConnectionId, Connector, EventReceiver,
    EventSender, Transport, WebSocketConnector,
};
