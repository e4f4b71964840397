use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clipboard::ClipboardProvider;
use crate::error::{SessionError, SessionResult};
use crate::protocol::{ClientFrame, ServerEvent};
use crate::surface::{FitOutcome, NoticeLevel, Notifier, RenderSurface};
use super::connection::{Connection, ConnectionState, Transition};
use super::endpoint::Endpoint;
use super::line_buffer::{KeyClass, LineBuffer, LineEdit};
use super::transport::{ConnectionEvent, ConnectionId, Connector, EventSender};

/// Delay before retrying a fit on a surface that has no size yet
pub const FIT_RETRY_DELAY: Duration = Duration::from_millis(100);

pub const CONNECTING_BANNER: &str = "connecting...";
pub const CONNECTION_LOST_BANNER: &str = "connection lost";
pub const LOST_NOTICE: &str = "connection lost. please reconnect.";
pub const MANUAL_DISCONNECT_BANNER: &str = "manually disconnected";
pub const PROMPT: &str = "$ ";
pub const INTERRUPT_MARKER: &str = "^C\r\n";

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// The remote context one terminal view talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Cluster identifier; connecting without one fails
    pub target: Option<String>,
    /// Namespace kubectl commands run against
    pub namespace: String,
}

impl Session {
    pub fn new(target: Option<String>, namespace: impl Into<String>) -> Self {
        Self {
            target,
            namespace: namespace.into(),
        }
    }
}

/// Result of a resize request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Fitted { cols: u16, rows: u16 },
    /// The surface is not laid out yet; call `resize` again after the delay
    RetryAfter(Duration),
    /// The controller is disposed; nothing was fitted
    Ignored,
}

/// Drives one interactive kubectl terminal.
///
/// Owns the session, the current connection instance, the line buffer and
/// the render surface. Every input (keys, pastes, namespace switches) and
/// every channel event goes through `&mut self`, so ordering is whatever
/// order the host delivers them in.
pub struct SessionController<S: RenderSurface, N: Notifier> {
    session: Session,
    endpoint: Endpoint,
    connector: Box<dyn Connector>,
    events: EventSender,
    connection: Option<Connection>,
    next_id: ConnectionId,
    line: LineBuffer,
    surface: S,
    notifier: N,
    /// Last namespace shown in a banner, so repeated echoes stay quiet
    announced_namespace: Option<String>,
    /// Set by the first `disconnect` after a connect attempt
    disconnect_announced: bool,
    disposed: bool,
}

impl<S: RenderSurface, N: Notifier> SessionController<S, N> {
    pub fn new(
        session: Session,
        endpoint: Endpoint,
        connector: Box<dyn Connector>,
        events: EventSender,
        surface: S,
        notifier: N,
    ) -> Self {
        Self {
            session,
            endpoint,
            connector,
            events,
            connection: None,
            next_id: ConnectionId::new(1),
            line: LineBuffer::new(),
            surface,
            notifier,
            announced_namespace: None,
            disconnect_announced: false,
            disposed: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// The not-yet-submitted line as the client sees it
    pub fn pending_line(&self) -> &str {
        self.line.as_str()
    }

    /// State of the current connection instance (idle when none was made)
    pub fn state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map(Connection::state)
            .unwrap_or(ConnectionState::Idle)
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(Connection::id)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Greeting shown before the first connect
    pub fn show_welcome(&mut self) {
        if self.disposed {
            return;
        }
        let target = self.session.target.clone().unwrap_or_else(|| "(none)".to_string());

        self.surface.clear();
        self.surface.write_line(&format!("{GREEN}╭──────────────────────────────────────────╮{RESET}"));
        self.surface.write_line(&format!("{GREEN}│            kubectl terminal              │{RESET}"));
        self.surface.write_line(&format!("{GREEN}╰──────────────────────────────────────────╯{RESET}"));
        self.surface.write_line("");
        self.surface.write_line(&format!("{CYAN}Cluster:{RESET} {}", target));
        self.surface.write_line(&format!("{CYAN}Namespace:{RESET} {}", self.session.namespace));
        self.surface.write_line("");
        self.surface.write_line(&format!("{YELLOW}Pick a namespace and connect to start.{RESET}"));
        self.surface.write_line("");
    }

    /// Open a fresh connection for `namespace`, tearing down any existing one.
    ///
    /// Fails with [`SessionError::MissingTarget`] before touching the surface
    /// when there is no cluster id. Transport failures are also returned, after
    /// being shown on the surface.
    pub fn connect(&mut self, namespace: impl Into<String>) -> SessionResult<()> {
        if self.disposed {
            return Err(SessionError::Disposed);
        }
        let Some(target) = self.session.target.clone().filter(|t| !t.trim().is_empty()) else {
            warn!("connect requested without a cluster id");
            self.notifier.notify(NoticeLevel::Error, "missing cluster id");
            return Err(SessionError::MissingTarget);
        };

        self.session.namespace = namespace.into();
        let url = match self.endpoint.terminal_url(&target, &self.session.namespace) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "cannot build terminal url");
                self.notifier.notify(NoticeLevel::Error, &e.to_string());
                return Err(e);
            }
        };

        self.teardown();
        self.line.clear();
        self.announced_namespace = None;
        self.disconnect_announced = false;

        self.surface.clear();
        self.banner(YELLOW, CONNECTING_BANNER);

        let id = self.next_id;
        self.next_id = id.next();
        info!(connection = %id, %url, "connecting terminal");

        let mut connection = Connection::new(id);
        let result = connection.connect(self.connector.as_mut(), &url, self.events.clone());
        self.connection = Some(connection);

        if let Err(e) = &result {
            error!(connection = %id, error = %e, "terminal connection failed");
            self.banner(RED, &format!("connection error: {}", e));
            self.notifier.notify(NoticeLevel::Error, "terminal connection failed");
        }
        result
    }

    /// Close the connection on user request. Safe in any state, including
    /// after the remote dropped it; the banner appears once per connect.
    pub fn disconnect(&mut self) {
        if self.disposed {
            return;
        }
        if self.connection.as_mut().is_some_and(Connection::close) {
            info!("terminal disconnected by user");
        }
        self.line.clear();

        if !self.disconnect_announced {
            self.disconnect_announced = true;
            self.banner(YELLOW, MANUAL_DISCONNECT_BANNER);
            self.notifier.notify(NoticeLevel::Info, "terminal disconnected");
        }
    }

    /// Release the connection and detach from the surface. Later calls, and
    /// every other operation afterwards, do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.teardown();
        self.line.clear();
        self.disposed = true;
        debug!("terminal session disposed");
    }

    /// Feed one raw keystroke (as a terminal would encode it)
    pub fn handle_key(&mut self, data: &str) {
        if self.disposed {
            return;
        }

        if KeyClass::of(data) == KeyClass::Interrupt {
            self.line.clear();
            self.surface.write(INTERRUPT_MARKER);
            if self.is_connected() {
                self.send(ClientFrame::Interrupt);
            } else {
                self.lost_notice();
            }
            return;
        }

        if !self.is_connected() {
            self.lost_notice();
            return;
        }

        match self.line.apply(data) {
            LineEdit::Forward(bytes) => {
                self.send(ClientFrame::Input(bytes));
            }
            LineEdit::Submit(line) => {
                self.surface.write("\r\n");
                self.send(ClientFrame::Command(line));
            }
            LineEdit::Interrupt | LineEdit::Nothing => {}
        }
    }

    /// Send pasted text as one frame, bypassing the key classifier
    pub fn paste_text(&mut self, text: &str) {
        if self.disposed || text.is_empty() {
            return;
        }
        if !self.is_connected() {
            self.lost_notice();
            return;
        }
        if self.send(ClientFrame::QuickCommand(text.to_string())) {
            self.line.clear();
        }
    }

    /// Read the clipboard and paste it
    pub fn paste_from_clipboard(&mut self, clipboard: &mut dyn ClipboardProvider) {
        if self.disposed {
            return;
        }
        if !self.is_connected() {
            self.notifier.notify(NoticeLevel::Error, "connect the terminal first");
            return;
        }

        match clipboard.read_text() {
            Ok(text) => self.paste_text(&text),
            Err(e) => {
                warn!(error = %e, "paste failed");
                self.notice(RED, "paste failed: check clipboard permissions");
                self.notifier.notify(NoticeLevel::Error, &e.to_string());
            }
        }
    }

    /// Copy the surface selection to the clipboard. Returns false when there
    /// is no selection, so the caller can treat the key normally.
    pub fn copy_selection(&mut self, clipboard: &mut dyn ClipboardProvider) -> bool {
        if self.disposed || !self.surface.has_selection() {
            return false;
        }
        let Some(text) = self.surface.selection() else {
            return false;
        };

        match clipboard.write_text(&text) {
            Ok(()) => self.notifier.notify(NoticeLevel::Success, "copied selection"),
            Err(e) => {
                warn!(error = %e, "copy failed");
                self.notice(RED, "copy failed: check clipboard permissions");
                self.notifier.notify(NoticeLevel::Error, &e.to_string());
            }
        }
        true
    }

    /// Switch namespace. Always updates local state; when connected the
    /// remote is told as well and is expected to echo `namespace_changed`.
    pub fn change_namespace(&mut self, namespace: impl Into<String>) {
        if self.disposed {
            return;
        }
        let namespace = namespace.into();
        self.session.namespace = namespace.clone();
        if self.is_connected() {
            self.send(ClientFrame::ChangeNamespace(namespace));
        }
    }

    pub fn clear_surface(&mut self) {
        if !self.disposed {
            self.surface.clear();
        }
    }

    /// Re-lay out the surface. Purely local: connection state is untouched.
    pub fn resize(&mut self, cols: u16, rows: u16) -> ResizeOutcome {
        if self.disposed {
            return ResizeOutcome::Ignored;
        }
        match self.surface.fit(cols, rows) {
            FitOutcome::Fitted { cols, rows } => ResizeOutcome::Fitted { cols, rows },
            FitOutcome::Deferred => {
                debug!(cols, rows, "surface not laid out, deferring fit");
                ResizeOutcome::RetryAfter(FIT_RETRY_DELAY)
            }
        }
    }

    /// Apply an event reported by a connection instance. Events from
    /// instances other than the current one are dropped.
    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        if self.disposed {
            return;
        }
        let Some(connection) = self.connection.as_mut() else {
            debug!(connection = %event.id, "event with no connection");
            return;
        };
        if connection.id() != event.id {
            debug!(connection = %event.id, current = %connection.id(), "stale connection event");
            return;
        }

        let id = connection.id();
        match connection.apply(event.event) {
            Transition::Opened => self.on_open(id),
            Transition::Message(payload) => self.handle_payload(&payload),
            Transition::Lost => {
                info!(connection = %id, "terminal connection lost");
                self.line.clear();
                self.banner(RED, CONNECTION_LOST_BANNER);
                self.notifier.notify(NoticeLevel::Info, "terminal disconnected");
            }
            Transition::Failed(message) => {
                error!(connection = %id, error = %message, "terminal connection error");
                self.line.clear();
                self.banner(RED, &format!("connection error: {}", message));
                self.notifier.notify(NoticeLevel::Error, "terminal connection error");
            }
            Transition::Closed => debug!(connection = %id, "close completed"),
            Transition::Ignored => debug!(connection = %id, "event ignored in current state"),
        }
    }

    /// Dispatch one decoded server event
    pub fn handle_inbound_frame(&mut self, event: ServerEvent) {
        if self.disposed {
            return;
        }
        match event {
            ServerEvent::Output(text) => self.write_output(&text),
            ServerEvent::Error(text) => self.notice(RED, &text),
            ServerEvent::CommandResult => self.surface.write(PROMPT),
            ServerEvent::Clear => self.surface.clear(),
            ServerEvent::NamespaceChanged(namespace) => self.apply_namespace(namespace),
            ServerEvent::Unrecognized(kind) => debug!(kind = %kind, "ignoring unknown frame type"),
        }
    }

    fn on_open(&mut self, id: ConnectionId) {
        let target = self.session.target.clone().unwrap_or_default();
        let namespace = self.session.namespace.clone();
        info!(connection = %id, %target, %namespace, "terminal connected");

        self.banner(GREEN, &format!("connected to {}", target));
        self.banner(GREEN, &format!("namespace: {}", namespace));
        self.announced_namespace = Some(namespace);
        self.notifier.notify(NoticeLevel::Success, "terminal connected");
    }

    fn handle_payload(&mut self, payload: &str) {
        match ServerEvent::decode(payload) {
            Ok(event) => self.handle_inbound_frame(event),
            Err(failure) => {
                warn!(reason = %failure.reason, "non-protocol payload, showing as output");
                self.surface.write(&failure.raw);
            }
        }
    }

    /// Output may end mid-line; only completed lines get a line break
    fn write_output(&mut self, text: &str) {
        for piece in text.split_inclusive('\n') {
            match piece.strip_suffix('\n') {
                Some(line) => self.surface.write_line(line.strip_suffix('\r').unwrap_or(line)),
                None => self.surface.write(piece),
            }
        }
    }

    fn apply_namespace(&mut self, namespace: String) {
        self.session.namespace = namespace.clone();
        if self.announced_namespace.as_deref() == Some(namespace.as_str()) {
            return;
        }
        info!(%namespace, "namespace changed");
        self.banner(CYAN, &format!("namespace changed to: {}", namespace));
        self.notifier
            .notify(NoticeLevel::Info, &format!("namespace: {}", namespace));
        self.announced_namespace = Some(namespace);
    }

    /// Send a frame on the current connection, reporting failures on the
    /// surface. Returns whether the frame went out.
    fn send(&mut self, frame: ClientFrame) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            self.lost_notice();
            return false;
        };

        match connection.send(&frame) {
            Ok(()) => true,
            Err(SessionError::NotOpen(state)) => {
                debug!(%state, kind = frame.kind(), "dropping frame, connection not open");
                self.lost_notice();
                false
            }
            Err(e) => {
                error!(error = %e, kind = frame.kind(), "send failed");
                self.line.clear();
                self.banner(RED, &format!("connection error: {}", e));
                self.notifier.notify(NoticeLevel::Error, "terminal connection error");
                false
            }
        }
    }

    /// Close the current connection without any banner
    fn teardown(&mut self) {
        if let Some(mut previous) = self.connection.take() {
            if previous.close() {
                debug!(connection = %previous.id(), "closed previous connection");
            }
        }
    }

    fn lost_notice(&mut self) {
        self.notice(YELLOW, LOST_NOTICE);
    }

    fn notice(&mut self, color: &str, text: &str) {
        self.surface.write_line(&format!("\r\n{color}{text}{RESET}"));
    }

    fn banner(&mut self, color: &str, text: &str) {
        self.surface.write_line(&format!("{color}{text}{RESET}"));
    }
}

impl<S: RenderSurface, N: Notifier> Drop for SessionController<S, N> {
    fn drop(&mut self) {
        self.dispose();
    }
}
