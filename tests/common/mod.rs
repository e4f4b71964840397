#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use kubeterm::clipboard::ClipboardProvider;
use kubeterm::error::{SessionError, SessionResult};
use kubeterm::protocol::ClientFrame;
use kubeterm::session::{
    connection_events, ChannelEvent, ConnectionEvent, ConnectionId, Connector, Endpoint,
    EventReceiver, EventSender, Session, SessionController, Transport,
};
use kubeterm::surface::{FitOutcome, NoticeLevel, Notifier, RenderSurface};
use kubeterm::ui::{App, StatusLine, TerminalView};
use ratatui::{backend::TestBackend, Terminal};
use url::Url;

/// Render surface that remembers everything written to it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// Every `write` call, in order, across clears
    pub writes: Vec<String>,
    /// Text written since the last clear
    pub screen: String,
    pub clears: usize,
    pub selected: Option<String>,
}

impl RecordingSurface {
    /// Screen text with colour codes removed
    pub fn plain(&self) -> String {
        strip_ansi_escapes::strip_str(&self.screen)
    }

    /// Non-empty lines on screen, colour codes removed
    pub fn lines(&self) -> Vec<String> {
        self.plain()
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.plain().matches(needle).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn write(&mut self, text: &str) {
        self.writes.push(text.to_string());
        self.screen.push_str(text);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.screen.clear();
    }

    fn has_selection(&self) -> bool {
        self.selected.is_some()
    }

    fn selection(&self) -> Option<String> {
        self.selected.clone()
    }

    fn fit(&mut self, cols: u16, rows: u16) -> FitOutcome {
        if cols == 0 || rows == 0 {
            FitOutcome::Deferred
        } else {
            FitOutcome::Fitted { cols, rows }
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<(NoticeLevel, String)>,
}

impl RecordingNotifier {
    pub fn last(&self) -> Option<&(NoticeLevel, String)> {
        self.notices.last()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices.iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.notices.push((level, message.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct WireState {
    pub sent: Vec<String>,
    pub opened: Vec<(ConnectionId, Url)>,
    pub closes: usize,
    pub refuse_open: bool,
    pub break_send: bool,
}

/// Shared view of what every fake connection did
#[derive(Debug, Clone, Default)]
pub struct WireLog(Arc<Mutex<WireState>>);

impl WireLog {
    pub fn state(&self) -> MutexGuard<'_, WireState> {
        self.0.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    pub fn frames(&self) -> Vec<ClientFrame> {
        self.sent()
            .iter()
            .map(|payload| ClientFrame::decode(payload).unwrap())
            .collect()
    }

    pub fn opened(&self) -> usize {
        self.state().opened.len()
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }
}

pub struct RecordingConnector(pub WireLog);

impl Connector for RecordingConnector {
    fn open(
        &mut self,
        url: &Url,
        id: ConnectionId,
        _events: EventSender,
    ) -> SessionResult<Box<dyn Transport>> {
        let mut state = self.0.state();
        if state.refuse_open {
            return Err(SessionError::Transport("connection refused".to_string()));
        }
        state.opened.push((id, url.clone()));
        Ok(Box::new(RecordingTransport(self.0.clone())))
    }
}

pub struct RecordingTransport(WireLog);

impl Transport for RecordingTransport {
    fn send(&mut self, payload: String) -> SessionResult<()> {
        let mut state = self.0.state();
        if state.break_send {
            return Err(SessionError::Transport("broken pipe".to_string()));
        }
        state.sent.push(payload);
        Ok(())
    }

    fn close(&mut self) {
        self.0.state().closes += 1;
    }
}

/// Clipboard holding fixed text; `None` behaves like a denied permission
#[derive(Debug, Default)]
pub struct FakeClipboard {
    pub contents: Option<String>,
    pub written: Vec<String>,
    pub deny_write: bool,
}

impl FakeClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            contents: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn denied() -> Self {
        Self {
            contents: None,
            deny_write: true,
            ..Self::default()
        }
    }
}

impl ClipboardProvider for FakeClipboard {
    fn read_text(&mut self) -> SessionResult<String> {
        self.contents
            .clone()
            .ok_or_else(|| SessionError::ClipboardDenied("permission denied".to_string()))
    }

    fn write_text(&mut self, text: &str) -> SessionResult<()> {
        if self.deny_write {
            return Err(SessionError::ClipboardDenied("permission denied".to_string()));
        }
        self.written.push(text.to_string());
        Ok(())
    }
}

pub type TestController = SessionController<RecordingSurface, RecordingNotifier>;

/// Controller wired to recording fakes; nothing is connected yet
pub fn create_controller(target: Option<&str>) -> (TestController, WireLog, EventReceiver) {
    let wire = WireLog::default();
    let (tx, rx) = connection_events();
    let controller = SessionController::new(
        Session::new(target.map(str::to_string), "default"),
        Endpoint::default(),
        Box::new(RecordingConnector(wire.clone())),
        tx,
        RecordingSurface::default(),
        RecordingNotifier::default(),
    );
    (controller, wire, rx)
}

/// Deliver a channel event as the current connection instance
pub fn deliver(controller: &mut TestController, event: ChannelEvent) {
    let id = controller.connection_id().expect("no connection instance");
    controller.handle_connection_event(ConnectionEvent { id, event });
}

/// Deliver an inbound frame payload on the current connection
pub fn receive(controller: &mut TestController, payload: &str) {
    deliver(controller, ChannelEvent::Message(payload.to_string()));
}

/// Controller for `cluster-1` with an open connection
pub fn create_open_controller() -> (TestController, WireLog, EventReceiver) {
    let (mut controller, wire, rx) = create_controller(Some("cluster-1"));
    controller.connect("default").unwrap();
    deliver(&mut controller, ChannelEvent::Opened);
    (controller, wire, rx)
}

/// Feed each character of `text` as its own keystroke
pub fn type_text(controller: &mut TestController, text: &str) {
    for c in text.chars() {
        controller.handle_key(&c.to_string());
    }
}

/// TUI app around a recording connector, with the stock namespace list
pub fn create_test_app(target: Option<&str>) -> (App, WireLog, EventReceiver) {
    let wire = WireLog::default();
    let (tx, rx) = connection_events();
    let controller = SessionController::new(
        Session::new(target.map(str::to_string), "default"),
        Endpoint::default(),
        Box::new(RecordingConnector(wire.clone())),
        tx,
        TerminalView::default(),
        StatusLine::new(),
    );
    let namespaces = ["default", "kube-system", "kube-public"]
        .into_iter()
        .map(str::to_string)
        .collect();
    (App::new(controller, namespaces), wire, rx)
}

/// Deliver a channel event to the app's current connection instance
pub fn deliver_to_app(app: &mut App, event: ChannelEvent) {
    let id = app.controller.connection_id().expect("no connection instance");
    app.controller.handle_connection_event(ConnectionEvent { id, event });
}

/// App for `cluster-1` with an open connection
pub fn create_open_app() -> (App, WireLog, EventReceiver) {
    let (mut app, wire, rx) = create_test_app(Some("cluster-1"));
    app.reconnect();
    deliver_to_app(&mut app, ChannelEvent::Opened);
    (app, wire, rx)
}

/// Helper to render the app to a test terminal and return the buffer as a string
pub fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).unwrap();

    terminal
        .draw(|f| {
            kubeterm::ui::draw(f, app);
        })
        .unwrap();

    let buffer = terminal.backend().buffer();
    let mut result = String::new();
    for y in 0..height {
        for x in 0..width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        result.push('\n');
    }
    result
}
