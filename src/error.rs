use thiserror::Error;

use crate::session::ConnectionState;

/// Failures surfaced by the terminal session core.
///
/// None of these are fatal to a [`SessionController`](crate::session::SessionController):
/// they are turned into banners or notices at the boundary where they occur.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No cluster identifier was supplied, so there is nothing to connect to.
    #[error("missing cluster id")]
    MissingTarget,
    /// The duplex channel failed to open or broke while in use.
    #[error("transport error: {0}")]
    Transport(String),
    /// A frame was sent while the connection was not open.
    #[error("connection is not open ({0})")]
    NotOpen(ConnectionState),
    /// The clipboard could not be read or written.
    #[error("clipboard unavailable: {0}")]
    ClipboardDenied(String),
    /// The configured server could not be turned into a terminal URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// The controller was already disposed.
    #[error("session disposed")]
    Disposed,
}

pub type SessionResult<T> = Result<T, SessionError>;
