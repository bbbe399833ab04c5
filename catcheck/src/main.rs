//! catcheck: review AI-suggested catalog text corrections from the terminal.
//!
//! Startup order:
//!
//! 1. Parse arguments, load config, start file logging.
//! 2. `check` subcommand: run headless and exit.
//! 3. `install_panic_hook()` before the terminal is touched.
//! 4. `register_sigterm()`, polled by the event loop heartbeat.
//! 5. `init_tui()`, event task, API worker, refresh timer.
//!
//! `restore_tui()` runs once after the event loop returns, whether it ended by
//! quit, SIGTERM, closed input or a draw error.

mod api;
mod app;
mod check;
mod event;
mod task;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catcheck_core::client::BackendClient;
use catcheck_core::config::Config;
use catcheck_core::notify::{ChannelNotifier, Notifier};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::api::ApiRequest;
use crate::app::AppState;
use crate::event::{AppEvent, EventHandler};
use crate::task::ScopedTask;
use crate::theme::Theme;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

#[derive(Debug, Parser)]
#[command(name = "catcheck", version, about = "Review AI text corrections for catalog spreadsheets")]
struct Cli {
    /// Backend base URL (overrides the config file).
    #[arg(long)]
    backend_url: Option<String>,
    /// Spreadsheet to open on startup.
    #[arg(long)]
    sheet_id: Option<String>,
    /// Color theme: `catppuccin-mocha` or `dark`.
    #[arg(long)]
    theme: Option<String>,
    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze one text and print the suggestions.
    Check(check::CheckArgs),
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = match &self.config {
            Some(path) => Config::load(path),
            None => Config::load_default(),
        };
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(sheet_id) = &self.sheet_id {
            config.default_sheet = Some(sheet_id.clone());
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("exiting: {}", e);
            eprintln!("catcheck: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> catcheck_core::Result<()> {
    if let Err(e) = catcheck_core::logging::init() {
        eprintln!("catcheck: file logging disabled: {e}");
    }
    let config = cli.config();
    let client = BackendClient::new(&config.backend_url)?;
    tracing::info!(backend = client.base_url(), "backend configured");

    match cli.command {
        Some(Command::Check(args)) => check::run(&client, args).await,
        None => run_tui(config, client).await,
    }
}

async fn run_tui(config: Config, client: BackendClient) -> catcheck_core::Result<()> {
    let theme = Theme::from_name(&config.theme);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = EventHandler::new();
    event::spawn_event_task(handler.tx.clone());

    let notifier: Arc<dyn Notifier> =
        Arc::new(ChannelNotifier::new(handler.tx.clone(), AppEvent::Notify));

    let (api_tx, api_rx) = mpsc::unbounded_channel();
    tokio::spawn(api::worker::api_worker_loop(
        client,
        api_rx,
        handler.tx.clone(),
        Arc::clone(&notifier),
    ));

    let _refresh = (config.refresh_interval_secs > 0).then(|| {
        ScopedTask::every(
            Duration::from_secs(config.refresh_interval_secs),
            handler.tx.clone(),
            || AppEvent::RefreshDue,
        )
    });

    let mut state = AppState::new(&config, notifier);
    state.startup();

    let outcome = event_loop(
        &mut terminal,
        handler,
        &mut state,
        &theme,
        &api_tx,
        &term_flag,
    )
    .await;

    tui::restore_tui()?;
    outcome
}

fn forward(state: &mut AppState, api_tx: &mpsc::UnboundedSender<ApiRequest>) {
    for request in state.take_requests() {
        if api_tx.send(request).is_err() {
            tracing::error!("api worker is gone; request dropped");
        }
    }
}

async fn event_loop(
    terminal: &mut tui::Tui,
    handler: EventHandler,
    state: &mut AppState,
    theme: &Theme,
    api_tx: &mpsc::UnboundedSender<ApiRequest>,
    term_flag: &AtomicBool,
) -> catcheck_core::Result<()> {
    let EventHandler { tx: _tx, mut rx } = handler;
    forward(state, api_tx);

    loop {
        tokio::select! {
            // Heartbeat so SIGTERM is seen even when no event arrives.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    tracing::info!("SIGTERM received");
                    return Ok(());
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        terminal.draw(|frame| ui::render(frame, state, theme))?;
                    }
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, state) == KeyAction::Quit {
                            return Ok(());
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => handle_mouse(mouse, state),
                    // ratatui picks the new size up on the next draw.
                    Some(AppEvent::Resize(..)) => {}
                    Some(AppEvent::Tick) => state.on_tick(),
                    Some(AppEvent::RefreshDue) => state.refresh_due(),
                    Some(AppEvent::Api(event)) => state.apply_api(*event),
                    Some(AppEvent::Notify(notification)) => state.show_notification(notification),
                    Some(AppEvent::Quit) | None => return Ok(()),
                }
                forward(state, api_tx);
                if term_flag.load(Ordering::Relaxed) {
                    return Ok(());
                }
            }
        }
    }
}
