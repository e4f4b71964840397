mod common;

use common::*;
use kubeterm::error::SessionError;
use kubeterm::protocol::{ClientFrame, ServerEvent};
use kubeterm::session::controller::{
    CONNECTION_LOST_BANNER, LOST_NOTICE, MANUAL_DISCONNECT_BANNER,
};
use kubeterm::session::line_buffer::BACKSPACE;
use kubeterm::session::{
    ChannelEvent, ConnectionEvent, ConnectionState, ResizeOutcome, FIT_RETRY_DELAY,
};
use kubeterm::surface::NoticeLevel;

#[test]
fn test_keys_while_disconnected_send_nothing() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    type_text(&mut controller, "get");
    controller.handle_key("\r");

    assert!(wire.sent().is_empty());
    assert_eq!(controller.surface().count(LOST_NOTICE), 4);
    assert_eq!(controller.pending_line(), "");
}

#[test]
fn test_keys_while_connecting_send_nothing() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));
    controller.connect("default").unwrap();
    assert_eq!(controller.state(), ConnectionState::Connecting);

    type_text(&mut controller, "ab");

    assert!(wire.sent().is_empty());
    assert_eq!(controller.surface().count(LOST_NOTICE), 2);
}

#[test]
fn test_submit_sends_one_command_and_clears_line() {
    let (mut controller, wire, _rx) = create_open_controller();

    type_text(&mut controller, "get pods");
    assert_eq!(controller.pending_line(), "get pods");
    controller.handle_key("\r");

    let frames = wire.frames();
    let commands: Vec<_> = frames
        .iter()
        .filter(|f| matches!(f, ClientFrame::Command(_)))
        .collect();
    assert_eq!(commands, vec![&ClientFrame::Command("get pods".to_string())]);
    assert_eq!(frames.len(), 9, "eight echoed keystrokes plus the command");
    assert_eq!(controller.pending_line(), "");
    assert_eq!(controller.surface().writes.last().map(String::as_str), Some("\r\n"));
}

#[test]
fn test_submit_trims_surrounding_whitespace() {
    let (mut controller, wire, _rx) = create_open_controller();

    type_text(&mut controller, "  get ns  ");
    controller.handle_key("\r");

    assert_eq!(wire.frames().last(), Some(&ClientFrame::Command("get ns".to_string())));
}

#[test]
fn test_backspace_on_empty_line_is_not_sent() {
    let (mut controller, wire, _rx) = create_open_controller();

    controller.handle_key(BACKSPACE);
    assert!(wire.sent().is_empty());

    controller.handle_key("a");
    controller.handle_key(BACKSPACE);
    controller.handle_key(BACKSPACE);

    assert_eq!(
        wire.frames(),
        vec![
            ClientFrame::Input("a".to_string()),
            ClientFrame::Input(BACKSPACE.to_string()),
        ]
    );
    assert_eq!(controller.pending_line(), "");
}

#[test]
fn test_non_printable_keys_are_not_forwarded() {
    let (mut controller, wire, _rx) = create_open_controller();

    controller.handle_key("\u{1b}[A");
    controller.handle_key("\t");

    assert!(wire.sent().is_empty());
}

#[test]
fn test_interrupt_when_open_sends_frame_and_clears_line() {
    let (mut controller, wire, _rx) = create_open_controller();

    type_text(&mut controller, "logs -f web");
    controller.handle_key("\u{3}");

    assert_eq!(wire.frames().last(), Some(&ClientFrame::Interrupt));
    assert_eq!(controller.pending_line(), "");
    assert!(controller.surface().plain().contains("^C"));
}

#[test]
fn test_interrupt_when_disconnected_still_echoes() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    controller.handle_key("\u{3}");

    assert!(wire.sent().is_empty());
    assert!(controller.surface().plain().contains("^C"));
    assert_eq!(controller.surface().count(LOST_NOTICE), 1);
}

#[test]
fn test_output_frame_roundtrip_keeps_newlines() {
    let event = ServerEvent::Output("foo\nbar".to_string());
    let decoded = ServerEvent::decode(&event.encode()).unwrap();
    assert_eq!(decoded, ServerEvent::Output("foo\nbar".to_string()));
}

#[test]
fn test_disconnect_twice_banners_once() {
    let (mut controller, wire, _rx) = create_open_controller();

    controller.disconnect();
    controller.disconnect();

    assert_eq!(controller.surface().count(MANUAL_DISCONNECT_BANNER), 1);
    assert_eq!(wire.closes(), 1);
    assert_eq!(controller.state(), ConnectionState::Closing);

    deliver(&mut controller, ChannelEvent::Closed);
    assert_eq!(controller.state(), ConnectionState::Closed);
    // A completed close is not a lost connection
    assert_eq!(controller.surface().count(CONNECTION_LOST_BANNER), 0);
}

#[test]
fn test_disconnect_without_connection_banners_once() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    controller.disconnect();
    controller.disconnect();

    assert_eq!(controller.surface().count(MANUAL_DISCONNECT_BANNER), 1);
    assert_eq!(controller.notifier().count(NoticeLevel::Info), 1);
    assert_eq!(wire.closes(), 0);
}

#[test]
fn test_disconnect_after_remote_drop_banners_once() {
    let (mut controller, wire, _rx) = create_open_controller();
    deliver(&mut controller, ChannelEvent::Closed);
    assert_eq!(controller.surface().count(CONNECTION_LOST_BANNER), 1);

    controller.disconnect();
    controller.disconnect();

    assert_eq!(controller.surface().count(MANUAL_DISCONNECT_BANNER), 1);
    assert_eq!(controller.state(), ConnectionState::Closed);
    assert_eq!(wire.closes(), 0);
}

#[test]
fn test_disconnect_after_error_banners_once() {
    let (mut controller, _wire, _rx) = create_open_controller();
    deliver(&mut controller, ChannelEvent::Error("reset by peer".to_string()));

    controller.disconnect();

    assert_eq!(controller.surface().count(MANUAL_DISCONNECT_BANNER), 1);
    assert_eq!(controller.state(), ConnectionState::Errored);
}

#[test]
fn test_reconnect_rearms_disconnect_banner() {
    let (mut controller, _wire, _rx) = create_open_controller();
    controller.disconnect();

    controller.connect("default").unwrap();
    deliver(&mut controller, ChannelEvent::Opened);
    controller.disconnect();

    // connect clears the surface, so only the second banner remains
    assert_eq!(controller.surface().count(MANUAL_DISCONNECT_BANNER), 1);
    assert_eq!(
        controller
            .surface()
            .writes
            .iter()
            .filter(|w| w.contains(MANUAL_DISCONNECT_BANNER))
            .count(),
        2
    );
}

#[test]
fn test_connect_banners_and_namespace_change() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    controller.connect("default").unwrap();
    deliver(&mut controller, ChannelEvent::Opened);

    assert_eq!(
        controller.surface().lines(),
        vec!["connecting...", "connected to cluster-1", "namespace: default"]
    );
    assert_eq!(
        controller.notifier().last(),
        Some(&(NoticeLevel::Success, "terminal connected".to_string()))
    );

    receive(&mut controller, r#"{"type":"namespace_changed","data":"kube-system"}"#);

    assert_eq!(controller.session().namespace, "kube-system");
    assert!(controller
        .surface()
        .lines()
        .contains(&"namespace changed to: kube-system".to_string()));
    assert_eq!(wire.opened(), 1);
    assert!(controller.is_connected());
}

#[test]
fn test_connect_url_carries_target_and_namespace() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));
    controller.connect("kube-system").unwrap();

    let url = wire.state().opened[0].1.clone();
    assert_eq!(
        url.as_str(),
        "ws://localhost:8080/ws/clusters/cluster-1/terminal?namespace=kube-system"
    );
    assert_eq!(controller.session().namespace, "kube-system");
}

#[test]
fn test_namespace_echo_banners_once() {
    let (mut controller, wire, _rx) = create_open_controller();

    controller.change_namespace("monitoring");
    assert_eq!(
        wire.frames(),
        vec![ClientFrame::ChangeNamespace("monitoring".to_string())]
    );
    assert_eq!(controller.session().namespace, "monitoring");

    let echo = r#"{"type":"namespace_changed","data":"monitoring"}"#;
    receive(&mut controller, echo);
    receive(&mut controller, echo);

    assert_eq!(controller.surface().count("namespace changed to: monitoring"), 1);
}

#[test]
fn test_namespace_change_while_disconnected_is_local() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    controller.change_namespace("kube-public");

    assert_eq!(controller.session().namespace, "kube-public");
    assert!(wire.sent().is_empty());
    assert!(controller.surface().writes.is_empty());
}

#[test]
fn test_events_from_previous_connection_are_ignored() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));
    controller.connect("default").unwrap();
    let first = controller.connection_id().unwrap();

    controller.connect("default").unwrap();
    let second = controller.connection_id().unwrap();
    assert_ne!(first, second);
    assert_eq!(wire.opened(), 2);
    assert_eq!(wire.closes(), 1, "reconnect closes the previous instance");

    controller.handle_connection_event(ConnectionEvent {
        id: first,
        event: ChannelEvent::Opened,
    });
    assert_eq!(controller.state(), ConnectionState::Connecting);

    controller.handle_connection_event(ConnectionEvent {
        id: first,
        event: ChannelEvent::Closed,
    });
    assert_eq!(controller.surface().count(CONNECTION_LOST_BANNER), 0);

    deliver(&mut controller, ChannelEvent::Opened);
    assert!(controller.is_connected());
}

#[test]
fn test_remote_close_shows_lost_banner() {
    let (mut controller, _wire, _rx) = create_open_controller();
    type_text(&mut controller, "get");

    deliver(&mut controller, ChannelEvent::Closed);

    assert_eq!(controller.state(), ConnectionState::Closed);
    assert_eq!(controller.surface().count(CONNECTION_LOST_BANNER), 1);
    assert_eq!(controller.pending_line(), "");
    assert_eq!(
        controller.notifier().last(),
        Some(&(NoticeLevel::Info, "terminal disconnected".to_string()))
    );
}

#[test]
fn test_channel_error_marks_errored() {
    let (mut controller, _wire, _rx) = create_open_controller();

    deliver(&mut controller, ChannelEvent::Error("reset by peer".to_string()));

    assert_eq!(controller.state(), ConnectionState::Errored);
    assert_eq!(controller.surface().count("connection error: reset by peer"), 1);
    assert_eq!(controller.notifier().count(NoticeLevel::Error), 1);

    // A manual reconnect is the way back
    controller.connect("default").unwrap();
    deliver(&mut controller, ChannelEvent::Opened);
    assert!(controller.is_connected());
}

#[test]
fn test_connect_without_target_fails_before_touching_surface() {
    let (mut controller, wire, _rx) = create_controller(None);

    let result = controller.connect("default");

    assert_eq!(result, Err(SessionError::MissingTarget));
    assert!(controller.surface().writes.is_empty());
    assert_eq!(controller.surface().clears, 0);
    assert_eq!(wire.opened(), 0);
    assert_eq!(
        controller.notifier().last(),
        Some(&(NoticeLevel::Error, "missing cluster id".to_string()))
    );
}

#[test]
fn test_refused_connection_is_shown() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));
    wire.state().refuse_open = true;

    let result = controller.connect("default");

    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(controller.state(), ConnectionState::Errored);
    assert_eq!(controller.surface().count("connection error:"), 1);
}

#[test]
fn test_send_failure_marks_errored_once() {
    let (mut controller, wire, _rx) = create_open_controller();
    wire.state().break_send = true;

    controller.handle_key("k");
    controller.handle_key("k");

    assert_eq!(controller.state(), ConnectionState::Errored);
    assert_eq!(controller.surface().count("connection error: transport error: broken pipe"), 1);
    assert_eq!(controller.surface().count(LOST_NOTICE), 1);
}

#[test]
fn test_output_is_written_by_line() {
    let (mut controller, _wire, _rx) = create_open_controller();
    let before = controller.surface().screen.len();

    receive(
        &mut controller,
        r#"{"type":"output","data":"NAME    READY\nnginx   1/1\n$ "}"#,
    );

    let written = &controller.surface().screen[before..];
    assert_eq!(written, "NAME    READY\r\nnginx   1/1\r\n$ ");
}

#[test]
fn test_output_ending_in_newline_adds_no_blank_line() {
    let (mut controller, _wire, _rx) = create_open_controller();
    let before = controller.surface().screen.len();

    receive(&mut controller, r#"{"type":"output","data":"done\n"}"#);

    assert_eq!(&controller.surface().screen[before..], "done\r\n");
}

#[test]
fn test_error_frame_starts_on_its_own_line() {
    let (mut controller, _wire, _rx) = create_open_controller();
    receive(&mut controller, r#"{"type":"command_result"}"#);
    receive(&mut controller, r#"{"type":"output","data":"partial"}"#);

    receive(&mut controller, r#"{"type":"error","data":"forbidden"}"#);

    assert!(
        controller
            .surface()
            .screen
            .ends_with("$ partial\r\n\x1b[31mforbidden\x1b[0m\r\n")
    );
    assert!(controller.surface().lines().contains(&"forbidden".to_string()));
}

#[test]
fn test_server_frames_dispatch() {
    let (mut controller, _wire, _rx) = create_open_controller();

    receive(&mut controller, r#"{"type":"error","data":"forbidden"}"#);
    assert!(controller.surface().screen.contains("\x1b[31mforbidden\x1b[0m\r\n"));

    receive(&mut controller, r#"{"type":"command_result"}"#);
    assert!(controller.surface().screen.ends_with("$ "));

    let clears = controller.surface().clears;
    receive(&mut controller, r#"{"type":"clear"}"#);
    assert_eq!(controller.surface().clears, clears + 1);
    assert!(controller.surface().screen.is_empty());
}

#[test]
fn test_non_protocol_payload_is_shown_raw() {
    let (mut controller, _wire, _rx) = create_open_controller();

    receive(&mut controller, "plain bytes from the shell");

    assert!(controller.surface().screen.ends_with("plain bytes from the shell"));
    assert!(controller.is_connected());
}

#[test]
fn test_unknown_frame_type_is_ignored() {
    let (mut controller, _wire, _rx) = create_open_controller();
    let writes = controller.surface().writes.len();

    receive(&mut controller, r#"{"type":"heartbeat","data":"1"}"#);

    assert_eq!(controller.surface().writes.len(), writes);
}

#[test]
fn test_paste_sends_quick_command() {
    let (mut controller, wire, _rx) = create_open_controller();
    type_text(&mut controller, "ge");

    controller.paste_text("get pods -A");

    assert_eq!(
        wire.frames().last(),
        Some(&ClientFrame::QuickCommand("get pods -A".to_string()))
    );
    assert_eq!(controller.pending_line(), "");
}

#[test]
fn test_paste_while_disconnected_warns() {
    let (mut controller, wire, _rx) = create_controller(Some("cluster-1"));

    controller.paste_text("get pods");

    assert!(wire.sent().is_empty());
    assert_eq!(controller.surface().count(LOST_NOTICE), 1);
}

#[test]
fn test_paste_from_clipboard() {
    let (mut controller, wire, _rx) = create_open_controller();
    let mut clipboard = FakeClipboard::with_text("describe pod nginx");

    controller.paste_from_clipboard(&mut clipboard);

    assert_eq!(
        wire.frames(),
        vec![ClientFrame::QuickCommand("describe pod nginx".to_string())]
    );
}

#[test]
fn test_clipboard_denied_is_reported_once() {
    let (mut controller, wire, _rx) = create_open_controller();
    let mut clipboard = FakeClipboard::denied();

    controller.paste_from_clipboard(&mut clipboard);

    assert!(wire.sent().is_empty());
    assert_eq!(controller.surface().count("paste failed"), 1);
    assert_eq!(
        controller.notifier().last(),
        Some(&(
            NoticeLevel::Error,
            "clipboard unavailable: permission denied".to_string()
        ))
    );
    assert!(controller.is_connected());
}

#[test]
fn test_clipboard_paste_requires_connection() {
    let (mut controller, _wire, _rx) = create_controller(Some("cluster-1"));
    let mut clipboard = FakeClipboard::with_text("get pods");

    controller.paste_from_clipboard(&mut clipboard);

    assert!(controller.surface().writes.is_empty());
    assert_eq!(controller.notifier().count(NoticeLevel::Error), 1);
}

#[test]
fn test_copy_selection() {
    let (mut controller, _wire, _rx) = create_open_controller();
    let mut clipboard = FakeClipboard::default();

    assert!(!controller.copy_selection(&mut clipboard));

    controller.surface_mut().selected = Some("nginx-7c5d 1/1 Running".to_string());
    assert!(controller.copy_selection(&mut clipboard));
    assert_eq!(clipboard.written, vec!["nginx-7c5d 1/1 Running".to_string()]);

    let mut denied = FakeClipboard::denied();
    assert!(controller.copy_selection(&mut denied));
    assert_eq!(controller.surface().count("copy failed"), 1);
}

#[test]
fn test_resize_defers_until_surface_has_size() {
    let (mut controller, _wire, _rx) = create_open_controller();

    assert_eq!(controller.resize(0, 30), ResizeOutcome::RetryAfter(FIT_RETRY_DELAY));
    assert_eq!(controller.resize(120, 30), ResizeOutcome::Fitted { cols: 120, rows: 30 });
    assert!(controller.is_connected());
}

#[test]
fn test_resize_after_dispose_fits_nothing() {
    let (mut controller, _wire, _rx) = create_open_controller();
    controller.dispose();

    assert_eq!(controller.resize(120, 30), ResizeOutcome::Ignored);
    assert_eq!(controller.resize(0, 0), ResizeOutcome::Ignored);
}

#[test]
fn test_clear_surface() {
    let (mut controller, _wire, _rx) = create_open_controller();
    controller.clear_surface();
    assert!(controller.surface().screen.is_empty());
    assert!(controller.is_connected());
}

#[test]
fn test_welcome_screen() {
    let (mut controller, _wire, _rx) = create_controller(Some("cluster-1"));
    controller.show_welcome();

    let lines = controller.surface().lines();
    assert!(lines.contains(&"Cluster: cluster-1".to_string()));
    assert!(lines.contains(&"Namespace: default".to_string()));
}

#[test]
fn test_dispose_is_idempotent_and_final() {
    let (mut controller, wire, _rx) = create_open_controller();

    controller.dispose();
    controller.dispose();
    assert_eq!(wire.closes(), 1);
    assert!(controller.is_disposed());

    let writes = controller.surface().writes.len();
    controller.handle_key("a");
    controller.handle_key("\u{3}");
    controller.disconnect();
    assert_eq!(controller.surface().writes.len(), writes);
    assert!(wire.sent().is_empty());
    assert_eq!(controller.connect("default"), Err(SessionError::Disposed));
}

#[test]
fn test_drop_releases_connection() {
    let (controller, wire, _rx) = create_open_controller();
    drop(controller);
    assert_eq!(wire.closes(), 1);
}
