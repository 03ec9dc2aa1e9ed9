mod tail;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use logtint_core::{
    BootstrapOutcome, ChangeTriggerGate, Config, MemorySurface, PassOutcome, PassReport,
    Reconciler, SharedSurface, SurfaceRegistry, Trigger, bootstrap, export_document,
};
use logtint_tui::{
    Action, AppState, Event, EventHandler, KeyBindings, KeyContext, LogViewerScreen, Tui,
};

use crate::tail::FileTailer;

/// Logtint - severity highlighting for a live log file
#[derive(Parser, Debug)]
#[command(name = "logtint")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to follow
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only treat the file as the log surface once it contains this text
    #[arg(long)]
    marker: Option<String>,

    /// Write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Fallback poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// The terminal belongs to the UI, so diagnostics go to a file or nowhere
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(marker) = &args.marker {
        config.discovery.marker = marker.clone();
    }
    if let Some(poll_ms) = args.poll_ms {
        config.timing.poll_interval_ms = poll_ms;
    }
    config.timing = config.timing.normalized();

    Ok(config)
}

async fn run_app(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let cancel = CancellationToken::new();

    // Surface fed by the tailer, observed by the gate
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let surface = MemorySurface::default().with_notifier(notice_tx).shared();
    let registry = SurfaceRegistry::new(config.discovery.marker.clone());
    registry.register(Arc::clone(&surface));

    let tailer = FileTailer::new(args.file.clone(), Arc::clone(&surface), config.tail.interval());
    tailer
        .sync_once()
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    tokio::spawn(tailer.run(cancel.child_token()));

    let reconciler = Arc::new(Reconciler::from_config(&config));
    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<PassReport>();

    // Initial pass after discovery retries
    {
        let registry = registry.clone();
        let reconciler = Arc::clone(&reconciler);
        let timing = config.timing.clone();
        let cancel = cancel.child_token();
        let report_tx = report_tx.clone();
        tokio::spawn(async move {
            if let BootstrapOutcome::Ran { outcome, .. } =
                bootstrap(&registry, &reconciler, &timing, &cancel).await
            {
                let _ = report_tx.send(PassReport {
                    trigger: Trigger::Bootstrap,
                    outcome,
                });
            }
        });
    }

    let gate = ChangeTriggerGate::new(registry.clone(), Arc::clone(&reconciler), &config.timing)
        .with_reports(report_tx);
    let gate_task = tokio::spawn(gate.run(notice_rx, cancel.child_token()));

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut state = AppState::new(args.file.display().to_string(), action_tx);

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250), cancel.child_token());
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state, &surface)?;

    // Main event loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let context = if state.ui_state.help_visible {
                            KeyContext::Help
                        } else {
                            KeyContext::LogViewer
                        };
                        if let Some(action) = keybindings.get_action(context, &key) {
                            let _ = state.action_tx.send(action);
                        }
                    }
                    Event::Tick => {
                        let _ = state.action_tx.send(Action::Tick);
                    }
                    Event::Resize(_, _) => {
                        let _ = state.action_tx.send(Action::Render);
                    }
                    Event::Error(e) => {
                        let _ = state.action_tx.send(Action::ShowMessage(format!("Terminal error: {}", e)));
                    }
                }
            }

            Some(report) = report_rx.recv() => {
                state.record_pass(&report, reconciler.stats());
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &surface, &registry, &reconciler, action);
            }
        }

        if state.should_quit {
            break;
        }

        if state.render_dirty {
            render(&mut tui, &mut state, &surface)?;
        }
    }

    events.shutdown();
    cancel.cancel();
    tui.restore()?;

    if let Ok(stats) = gate_task.await {
        info!(?stats, "gate stopped");
    }

    Ok(())
}

fn handle_action(
    state: &mut AppState,
    surface: &SharedSurface,
    registry: &SurfaceRegistry,
    reconciler: &Reconciler,
    action: Action,
) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
            state.render_dirty = true;
        }
        Action::ToggleFollow => state.toggle_follow(&mut *surface.lock()),
        Action::ToggleStats => {
            state.ui_state.stats_visible = !state.ui_state.stats_visible;
            state.render_dirty = true;
        }
        Action::ScrollUp(n) => state.scroll_up(&mut *surface.lock(), n),
        Action::ScrollDown(n) => state.scroll_down(&mut *surface.lock(), n),
        Action::PageUp => state.page_up(&mut *surface.lock()),
        Action::PageDown => state.page_down(&mut *surface.lock()),
        Action::ScrollToTop => state.scroll_to_top(&mut *surface.lock()),
        Action::ScrollToBottom => state.scroll_to_bottom(&mut *surface.lock()),

        Action::Refresh => {
            let outcome = reconciler.reconcile_located(registry);
            let message = match &outcome {
                PassOutcome::Synced { appended, total, .. } => {
                    format!("Reconciled: {} new, {} total", appended, total)
                }
                PassOutcome::FastSkip => "Already up to date".to_string(),
                PassOutcome::Busy => "A pass is already running".to_string(),
                PassOutcome::NoSurface => "Log surface not found".to_string(),
                PassOutcome::Failed(e) => format!("Pass failed: {}", e),
            };
            let report = PassReport {
                trigger: Trigger::Manual,
                outcome,
            };
            state.record_pass(&report, reconciler.stats());
            state.show_message(message);
        }
        Action::ExportHtml => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filename = format!("logtint_{}.html", timestamp);

            match export_html(&filename, &state.source, surface) {
                Ok(count) => state.show_message(format!("Exported {} lines to {}", count, filename)),
                Err(e) => state.show_message(format!("Export failed: {:#}", e)),
            }
        }

        Action::ShowMessage(msg) => state.show_message(msg),
        Action::DismissMessage => state.dismiss_message(),

        // New lines arrive through pass reports; ticks only keep follow mode pinned
        Action::Tick => {
            if state.ui_state.follow {
                state.sync_scroll(&mut *surface.lock());
            }
        }
        Action::Render => {
            state.render_dirty = true;
        }
    }
}

fn export_html(filename: &str, title: &str, surface: &SharedSurface) -> Result<usize> {
    let (document, count) = {
        let surface = surface.lock();
        let units = surface.units();
        (export_document(title, units), units.len())
    };
    std::fs::write(filename, document).with_context(|| format!("failed to write {}", filename))?;
    Ok(count)
}

fn render(tui: &mut Tui, state: &mut AppState, surface: &SharedSurface) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, state, &mut surface.lock());
    })?;
    state.render_dirty = false;
    Ok(())
}
