//! Ferrite entrypoint.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::{Collaborators, Dispatcher, Options};
use core_config::{Config, StatePaths};
use core_events::{
    EVENT_CHANNEL_CAP, Event, EventSourceRegistry, InputEvent, StopSignal, TickEventSource,
};
use core_input::CrosstermInputSource;
use core_render::Painter;
use core_syntax::{SyntaxParser, TreeSitterService};
use core_terminal::{CrosstermScreen, Screen};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "ferrite.log";
/// Status and prompt rows below the text area.
const CHROME_ROWS: u16 = 2;
const JOIN_TIMEOUT: Duration = Duration::from_millis(200);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "ferrite", version, about = "Ferrite modal text editor")]
struct Args {
    /// File to open; created on first write when it does not exist.
    pub path: Option<PathBuf>,
    /// Configuration file (overrides discovery of `ferrite.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn configure_logging(paths: &StatePaths) -> Option<WorkerGuard> {
    let log_dir = match paths.root() {
        Some(root) if std::fs::create_dir_all(root).is_ok() => root.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Everything loaded before the terminal is touched, so failures still
/// print to a normal screen.
struct Bootstrap {
    config: Config,
    dispatcher: Dispatcher,
    parser: Arc<TreeSitterService>,
}

fn bootstrap(args: &Args, paths: StatePaths) -> Result<Bootstrap> {
    let config = core_config::load_from(args.config.clone()).context("loading configuration")?;
    let parser = Arc::new(TreeSitterService::new());
    parser.start();
    let collab = Collaborators::system(parser.clone());
    let mut dispatcher = Dispatcher::new(Options::from_config(&config, paths), collab);
    if let Some(path) = &args.path {
        open_at_startup(&mut dispatcher, path)?;
    }
    Ok(Bootstrap {
        config,
        dispatcher,
        parser,
    })
}

fn open_at_startup(dispatcher: &mut Dispatcher, path: &Path) -> Result<()> {
    dispatcher
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    info!(target: "runtime", path = %path.display(), "opened at startup");
    Ok(())
}

enum LoopControl {
    Continue { redraw: bool },
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    Quit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::Quit => "quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct EditorRuntime {
    dispatcher: Dispatcher,
    config: Config,
    painter: Painter,
    screen: CrosstermScreen,
    parser: Arc<TreeSitterService>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    stop: StopSignal,
    source_handles: Vec<JoinHandle<()>>,
}

impl EditorRuntime {
    fn new(boot: Bootstrap, screen: CrosstermScreen) -> Self {
        let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
        let stop = StopSignal::new();
        let mut registry = EventSourceRegistry::new();
        let tick = Duration::from_millis(boot.config.file.runtime.tick_ms.max(1));
        registry.register(TickEventSource::new(tick));
        registry.register(CrosstermInputSource::new());
        let source_handles = registry.spawn_all(&tx, &stop);
        Self {
            dispatcher: boot.dispatcher,
            config: boot.config,
            painter: Painter::default(),
            screen,
            parser: boot.parser,
            rx,
            tx: Some(tx),
            stop,
            source_handles,
        }
    }

    async fn run(&mut self) -> Result<()> {
        let (cols, rows) = self.screen.size();
        self.resize(cols, rows);
        self.dispatcher.tick(Instant::now());
        self.render();

        let mut reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            let control = match &event {
                Event::Input(input) => self.handle_input(input),
                Event::Tick => LoopControl::Continue {
                    redraw: self.dispatcher.tick(Instant::now()),
                },
                Event::Wakeup => LoopControl::Continue { redraw: true },
                Event::Shutdown => LoopControl::Break {
                    reason: ShutdownReason::ShutdownEvent,
                },
            };
            match control {
                LoopControl::Break { reason: r } => {
                    reason = r;
                    break;
                }
                LoopControl::Continue { redraw: true } => self.render(),
                LoopControl::Continue { redraw: false } => {}
            }
        }

        self.finalize_shutdown(reason).await
    }

    fn handle_input(&mut self, input: &InputEvent) -> LoopControl {
        let result = match input {
            InputEvent::Resize(cols, rows) => self.resize(*cols, *rows),
            other => self.dispatcher.handle_event(other),
        };
        if result.quit {
            return LoopControl::Break {
                reason: ShutdownReason::Quit,
            };
        }
        if result.dirty {
            // Fold the edit into highlights before painting it.
            self.dispatcher.tick(Instant::now());
        }
        LoopControl::Continue {
            redraw: result.dirty,
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) -> core_actions::DispatchResult {
        self.screen.resize(cols, rows);
        let margin = self
            .config
            .apply_text_rows(rows.saturating_sub(CHROME_ROWS));
        trace!(target: "runtime", cols, rows, margin, "resize");
        self.dispatcher.set_scroll_margin(usize::from(margin));
        self.dispatcher.handle_resize(cols, rows)
    }

    fn render(&mut self) {
        if let Err(err) = self.painter.render(&self.dispatcher, &mut self.screen) {
            error!(target: "runtime", ?err, "render failed");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) -> Result<()> {
        info!(target: "runtime", %reason, "shutdown begin");
        self.stop.stop();
        drop(self.tx.take());
        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => trace!(target: "runtime.events", "event source stopped"),
                Ok(Err(err)) if err.is_cancelled() => {
                    trace!(target: "runtime.events", "event source cancelled")
                }
                Ok(Err(err)) => error!(target: "runtime.events", ?err, "event source failed"),
                Err(_) => warn!(target: "runtime.events", "event source did not stop in time"),
            }
        }
        self.parser.stop();
        self.screen.finalize()?;
        info!(target: "runtime", %reason, "shutdown complete");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let paths = StatePaths::discover();
    let _log_guard = configure_logging(&paths);
    install_panic_hook();
    info!(target: "runtime", "startup");

    let boot = bootstrap(&args, paths)?;
    let mut screen = CrosstermScreen::enter("ferrite").context("initializing terminal")?;
    screen.enable_mouse()?;
    let mut runtime = EditorRuntime::new(boot, screen);
    runtime.run().await
}
