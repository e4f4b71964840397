use std::time::Duration;

use clap::{CommandFactory, Parser};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
        EventStream,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};

use kubeterm::cli::{init_config, run_chat, Cli, Commands};
use kubeterm::clipboard::SystemClipboard;
use kubeterm::config::{Config, ConfigProvider};
use kubeterm::event_handler::EventHandler;
use kubeterm::logging;
use kubeterm::session::{connection_events, EventReceiver, Session, SessionController, WebSocketConnector};
use kubeterm::ui::{self, App, StatusLine, TerminalView};

/// Housekeeping interval (status line expiry)
const TICK: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle --init flag
    if cli.init {
        return init_config(&cli.config);
    }

    let mut provider = ConfigProvider::new(&cli.config);
    let config = provider.get()?.clone();

    logging::init(&cli.log_settings(&config))?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %provider.path().display(),
        "starting kubeterm"
    );

    match cli.command {
        Some(Commands::Connect {
            cluster,
            namespace,
            no_auto_connect,
        }) => run_terminal(&config, cluster, namespace, no_auto_connect).await,
        Some(Commands::Chat { cluster, message }) => {
            run_chat(&config, &cluster, &message.join(" ")).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

async fn run_terminal(
    config: &Config,
    cluster: String,
    namespace: Option<String>,
    no_auto_connect: bool,
) -> anyhow::Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        anyhow::bail!("'kt connect' needs an interactive terminal");
    }

    let namespace = namespace.unwrap_or_else(|| config.terminal.default_namespace.clone());
    let (events_tx, mut events_rx) = connection_events();
    let controller = SessionController::new(
        Session::new(Some(cluster), namespace),
        config.endpoint(),
        Box::new(WebSocketConnector),
        events_tx,
        TerminalView::new(config.terminal.scrollback),
        StatusLine::new(),
    );

    let mut app = App::new(controller, config.terminal.namespaces.clone());
    app.controller.show_welcome();
    if !no_auto_connect {
        app.reconnect();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // TUI event loop
    let result = run_app(&mut terminal, &mut app, &mut events_rx).await;

    // Release the connection before the terminal goes back to the shell
    app.controller.dispose();

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    events: &mut EventReceiver,
) -> anyhow::Result<()> {
    let mut input = EventStream::new();
    let mut clipboard = SystemClipboard;
    let mut tick = tokio::time::interval(TICK);
    let mut fit_deadline: Option<tokio::time::Instant> = None;

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(delay) = app.sync_size() {
            fit_deadline.get_or_insert_with(|| tokio::time::Instant::now() + delay);
        }
        if app.should_quit {
            break;
        }

        let deadline = fit_deadline;
        let fit_retry = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        // Note: in raw mode Ctrl+C arrives as a key event, not a signal
        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if EventHandler::new(app, &mut clipboard).handle_key_event(key) {
                        break;
                    }
                }
                Some(Ok(Event::Mouse(mouse))) => {
                    EventHandler::new(app, &mut clipboard).handle_mouse_event(mouse);
                }
                Some(Ok(Event::Paste(text))) => {
                    EventHandler::new(app, &mut clipboard).handle_paste(&text);
                }
                Some(Ok(Event::Resize(..))) => app.invalidate_size(),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = events.recv() => {
                app.controller.handle_connection_event(event);
                // Apply whatever else is queued before redrawing
                while let Ok(event) = events.try_recv() {
                    app.controller.handle_connection_event(event);
                }
            }
            _ = fit_retry => {
                fit_deadline = None;
                app.invalidate_size();
            }
            _ = tick.tick() => app.tick(std::time::Instant::now()),
        }
    }

    Ok(())
}
