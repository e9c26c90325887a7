//! Interactive terminal driver for the threadfold windowing engine.
//!
//! Renders a transcript into an in-memory document and reads commands from
//! stdin. Structural changes of the document are reconciled between
//! commands, the way a page observer would.
//!
//! # Examples
//!
//! ```sh
//! threadfold --transcript chat.json --keep 10
//! echo "collapse\nsearch retry\nrestore\nsearch retry\nnext\nexport" | threadfold
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use threadfold::prelude::*;
use threadfold::ui::update_status;
use threadfold_shell::command::HELP;
use threadfold_shell::transcript::synthetic_entries;
use threadfold_shell::{ShellCommand, ShellConfig, view};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Fold long conversations out of a document and restore them.
#[derive(Parser)]
#[command(name = "threadfold")]
struct Cli {
    /// Transcript JSON to render. Without this, a synthetic thread is used.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Address of the conversation (overrides the transcript's).
    #[arg(long)]
    url: Option<String>,

    /// Engine settings as JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Entries left attached by a collapse.
    #[arg(long)]
    keep: Option<usize>,

    /// Viewport height of the simulated document.
    #[arg(long, default_value_t = 800.0)]
    viewport: f64,

    /// Directory `export` writes into.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Mirror engine logs to stderr (filter with RUST_LOG).
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<ShellConfig, String> {
        let mut config = ShellConfig {
            transcript: self.transcript,
            url: self.url,
            viewport_height: self.viewport,
            export_dir: self.export_dir,
            verbose: self.verbose,
            ..Default::default()
        };
        if let Some(path) = &self.config {
            config = config.with_engine_file(path)?;
        }
        Ok(config.with_keep_latest(self.keep))
    }
}

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    // Set up tracing → panel log buffer, plus stderr when verbose.
    let (panel_layer, log_buffer) = PanelTracingLayer::new();
    let stderr_layer = config.verbose.then(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("threadfold=debug"));
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });
    tracing_subscriber::registry()
        .with(panel_layer)
        .with(stderr_layer)
        .init();

    let document = match config.build_document() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Panel state shared between the event handler and the renderer.
    let panel = Arc::new(Mutex::new(PanelState::default()));
    let handler = CompositeEventHandler::new()
        .with(LoggingHandler)
        .with(PanelEventHandler::new(panel.clone()));

    let mut session = EngineSession::new(document, config.engine.clone())
        .with_event_handler(handler)
        .with_export_sink(JsonFileSink::new(&config.export_dir));
    if let Ok(mut p) = panel.lock() {
        p.conversation = session.conversation().map(|k| k.to_string());
    }
    let mut changes = session.subscribe();

    println!(
        "threadfold: {} entries, keeping the latest {}. Type `help` for commands.",
        session.document().attached_keys().len(),
        session.config().keep_latest
    );

    let mut shell = Shell {
        session,
        panel,
        log_buffer,
        appended: 0,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        // Reconcile whatever the previous command did to the document
        // before reading the next one.
        let reconciled = shell.session.drain(&mut changes);
        if reconciled > 0 {
            tracing::trace!("reconciled {reconciled} structural changes");
        }
        shell.log_buffer.flush_into(&shell.panel);

        let _ = stdout.write_all(b"> ").await;
        let _ = stdout.flush().await;

        tokio::select! {
            biased;
            Some(change) = changes.recv() => {
                shell.session.reconcile(change);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match ShellCommand::parse(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(command)) => shell.run(command),
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                },
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error: failed to read stdin: {e}");
                    break;
                }
            },
        }
    }
}

/// Session plus the frontend pieces wired around it.
struct Shell {
    session: EngineSession<MemoryDocument>,
    panel: Arc<Mutex<PanelState>>,
    log_buffer: LogBuffer,
    appended: usize,
}

impl Shell {
    fn run(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Engine(command) => {
                let status = self.session.dispatch(command);
                self.report(status);
            }
            ShellCommand::ExportTo(dir) => {
                let status = self.session.export_to(&mut JsonFileSink::new(dir));
                self.report(status);
            }
            ShellCommand::List => println!("{}", view::render_list(self.session.document())),
            ShellCommand::Status => {
                self.log_buffer.flush_into(&self.panel);
                if let Ok(p) = self.panel.lock() {
                    println!("{}", view::render_panel(&p));
                }
            }
            ShellCommand::Logs(n) => {
                self.log_buffer.flush_into(&self.panel);
                if let Ok(p) = self.panel.lock() {
                    println!("{}", view::render_logs(&p.logs, n));
                }
            }
            ShellCommand::Append { role, text } => {
                self.appended += 1;
                let id = format!("local-{}", self.appended);
                self.session
                    .document_mut()
                    .append_entry(EntrySpec::new(role, text).with_id(id.clone()));
                println!("appended {id}");
            }
            ShellCommand::Remove(key) => {
                if self.session.document_mut().destroy_by_key(&key) {
                    println!("removed {key}");
                } else {
                    println!("no entry {key}");
                }
            }
            ShellCommand::Rerender => {
                self.session.document_mut().rerender();
                println!("re-rendered");
            }
            ShellCommand::Navigate { path, count } => {
                let prefix = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("n").to_string();
                let href = match self.session.document().location().href().split_once("://") {
                    Some((scheme, rest)) if path.starts_with('/') => {
                        let host = rest.split('/').next().unwrap_or_default();
                        format!("{scheme}://{host}{path}")
                    }
                    _ => path.clone(),
                };
                self.session
                    .document_mut()
                    .navigate(href, None, synthetic_entries(&format!("{prefix}-"), count));
                println!("navigated to {path} ({count} entries)");
            }
            ShellCommand::Scroll(dy) => {
                self.session.document_mut().scroll_by(dy);
                println!("scroll top {}", self.session.document().scroll_top());
            }
            ShellCommand::Keep(n) => {
                self.session.set_keep_latest(n);
                self.report(Status::info(format!("Keeping the latest {n} messages.")));
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => {}
        }
    }

    fn report(&self, status: Status) {
        println!("{}", view::render_status(&status));
        update_status(&self.panel, status);
    }
}
