use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use crate::chat::{CancelToken, ChatClient, ChatError, ChatEvent, ChatOutcome, ChatTranscript};
use crate::config::Config;
use crate::error::SessionError;
use crate::logging::{LogLevel, LogSettings};

/// `--log-file` value that selects stderr
const STDERR_LOG: &str = "-";

/// kubeterm - kubectl terminal for remote clusters
#[derive(Parser, Debug)]
#[command(name = "kt")]
#[command(version)]
#[command(about = "Interactive kubectl terminal for remote clusters")]
#[command(long_about = "kubeterm (kt) opens an interactive kubectl shell on a cluster managed by a
terminal server, streaming output as it arrives.

Quick start:
  1. Run 'kt --init' to generate a config file
  2. Point [server] host/port at your terminal server
  3. Run 'kt connect <cluster-id>' to open a terminal")]
pub struct Cli {
    /// Path to config file (defaults to .kubeterm.toml)
    #[arg(short, long, default_value = ".kubeterm.toml")]
    pub config: PathBuf,

    /// Write a default .kubeterm.toml and exit
    #[arg(long)]
    pub init: bool,

    /// Log verbosity (overrides [log] level)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log file (overrides [log] file; defaults to kubeterm.log in the temp dir).
    /// `-` logs to stderr, which only makes sense for `chat`.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open an interactive terminal on a cluster
    Connect {
        /// Cluster identifier known to the server
        cluster: String,
        /// Namespace to start in (defaults to [terminal] default_namespace)
        #[arg(short, long)]
        namespace: Option<String>,
        /// Show the welcome screen instead of connecting immediately
        #[arg(long)]
        no_auto_connect: bool,
    },
    /// Ask the cluster assistant a single question and stream the answer
    Chat {
        /// Cluster identifier known to the server
        cluster: String,
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

impl Cli {
    /// Logging settings from flags, falling back to the config file
    pub fn log_settings(&self, config: &Config) -> LogSettings {
        let file = self
            .log_file
            .clone()
            .or_else(|| config.log.file.clone())
            .unwrap_or_else(LogSettings::default_file);
        LogSettings {
            level: self.log_level.or(config.log.level).unwrap_or_default(),
            file: (file.as_os_str() != STDERR_LOG).then_some(file),
        }
    }
}

/// Write a default config, leaving an existing file alone
pub fn init_config(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        return Err(anyhow!(
            "Config file '{}' already exists.\n\n\
            Edit it directly, or remove it and run 'kt --init' again.",
            config_path.display()
        ));
    }

    Config::default()
        .save(config_path)
        .with_context(|| format!("Failed to write config file '{}'", config_path.display()))?;

    println!("Created {}", config_path.display());
    println!("Set [server] host and port, then run 'kt connect <cluster-id>'.");
    Ok(())
}

/// Stream one assistant answer to stdout. Ctrl+C stops the stream and
/// keeps whatever already arrived.
pub async fn run_chat(config: &Config, cluster: &str, message: &str) -> anyhow::Result<()> {
    if cluster.trim().is_empty() {
        return Err(SessionError::MissingTarget.into());
    }
    let url = config.endpoint().chat_url(cluster)?;
    let client = ChatClient::new(config.token());

    let mut transcript = ChatTranscript::new();
    let history = transcript
        .begin(message)
        .map_err(|e| anyhow!("cannot start chat: {:?}", e))?;

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();
    // A plain thread: a read blocked on the socket must not hold up exit after a stop
    std::thread::Builder::new()
        .name("chat-stream".to_string())
        .spawn(move || {
            let result = client.stream(&url, &history, &worker_cancel, |event| {
                if let ChatEvent::Content(text) = &event {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
                let _ = events_tx.send(event);
            });
            let _ = done_tx.send(result);
        })
        .context("cannot start chat stream")?;

    let streamed = follow_stream(
        &mut transcript,
        &mut events_rx,
        done_rx,
        tokio::signal::ctrl_c(),
        &cancel,
    )
    .await?;

    if let Some(reply) = transcript.messages().last() {
        for call in &reply.tool_calls {
            eprintln!("\n[tool] {}({})", call.function.name, call.function.arguments);
        }
        for result in &reply.tool_results {
            eprintln!("[result] {}: {}", result.name, result.result);
        }
        if !streamed {
            print!("{}", reply.content);
        }
    }
    println!();
    Ok(())
}

/// Apply streamed chat events to the transcript until the stream ends or
/// `stop` fires. A stop settles the transcript at once without waiting on
/// the stream. Returns whether any answer text arrived.
async fn follow_stream<S: Future>(
    transcript: &mut ChatTranscript,
    events: &mut mpsc::UnboundedReceiver<ChatEvent>,
    mut done: oneshot::Receiver<Result<ChatOutcome, ChatError>>,
    stop: S,
    cancel: &CancelToken,
) -> anyhow::Result<bool> {
    tokio::pin!(stop);
    let mut streamed = false;
    let mut apply = |transcript: &mut ChatTranscript, event: ChatEvent| {
        streamed |= matches!(event, ChatEvent::Content(_));
        transcript.apply(&event);
    };

    loop {
        tokio::select! {
            Some(event) = events.recv() => apply(transcript, event),
            finished = &mut done => {
                // Everything the stream produced is queued before its result
                while let Ok(event) = events.try_recv() {
                    apply(transcript, event);
                }
                match finished.context("chat stream ended without a result")? {
                    Ok(ChatOutcome::Completed) => transcript.finish(),
                    Ok(ChatOutcome::Stopped) => transcript.stop(),
                    Err(e) => transcript.fail(&e.to_string()),
                }
                break;
            }
            _ = &mut stop => {
                tracing::info!("chat stopped by user");
                cancel.cancel();
                while let Ok(event) = events.try_recv() {
                    apply(transcript, event);
                }
                transcript.stop();
                break;
            }
        }
    }
    Ok(streamed)
}
