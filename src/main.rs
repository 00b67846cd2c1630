// src/main.rs

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use color_eyre::eyre::Result;
use ratatui::prelude::*;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod logging;
mod ui;

use crate::app::{App, AppState};
use crate::cli::{Cli, Commands};
use crate::config::ReconConfig;
use crate::core::models::{ProgressEvent, ReconReport};
use crate::core::runner::SystemRunner;

type ResultSender = mpsc::Sender<std::result::Result<ReconReport, String>>;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse_args();
    let command = cli.command.unwrap_or(Commands::Tui);

    let console = match (&command, cli.verbose) {
        (Commands::Tui, _) | (_, 0) => None,
        (_, 1) => Some(LevelFilter::INFO),
        (_, 2) => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };
    let log_path = logging::initialize_logging(console)?;
    let config = ReconConfig::load(cli.config.as_deref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "reconkit starting.");

    match command {
        Commands::Tui => run_tui(config, log_path).await,
        Commands::Scan(args) => commands::scan(args, config).await,
        Commands::Check => commands::check(&config),
        Commands::Config => commands::config(&config),
    }
}

async fn run_tui(config: ReconConfig, log_path: PathBuf) -> Result<()> {
    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(log_path);
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let (result_tx, mut result_rx) = mpsc::channel(1);

    let outcome = event_loop(
        &mut terminal,
        &mut app,
        &config,
        &progress_tx,
        &mut progress_rx,
        &result_tx,
        &mut result_rx,
    )
    .await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    outcome
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    config: &ReconConfig,
    progress_tx: &mpsc::UnboundedSender<ProgressEvent>,
    progress_rx: &mut mpsc::UnboundedReceiver<ProgressEvent>,
    result_tx: &ResultSender,
    result_rx: &mut mpsc::Receiver<std::result::Result<ReconReport, String>>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, config, progress_tx, result_tx)?;
        }

        while let Ok(event) = progress_rx.try_recv() {
            app.on_progress(event);
        }
        if let Ok(result) = result_rx.try_recv() {
            app.finish(result);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(
    app: &mut App,
    config: &ReconConfig,
    progress_tx: &mpsc::UnboundedSender<ProgressEvent>,
    result_tx: &ResultSender,
) -> Result<()> {
    let Event::Key(key) = event::read()? else {
        return Ok(());
    };
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    match app.state {
        AppState::Disclaimer => match key.code {
            KeyCode::Enter => app.state = AppState::Idle,
            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
            _ => {}
        },
        AppState::Idle => match key.code {
            KeyCode::Esc => app.quit(),
            KeyCode::Tab => app.next_field(),
            KeyCode::Backspace => app.pop_char(),
            KeyCode::Char(c) => app.push_char(c),
            KeyCode::Enter => start_scan(app, config, progress_tx, result_tx),
            _ => {}
        },
        AppState::Scanning => match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('l') => app.toggle_logs(),
            KeyCode::Left => app.scroll_logs_left(),
            KeyCode::Right => app.scroll_logs_right(),
            _ => {}
        },
        AppState::Finished => match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('n') => app.reset(),
            KeyCode::Char('l') => app.toggle_logs(),
            KeyCode::Up => app.select_previous(),
            KeyCode::Down => app.select_next(),
            KeyCode::Left => app.scroll_logs_left(),
            KeyCode::Right => app.scroll_logs_right(),
            _ => {}
        },
    }
    Ok(())
}

fn start_scan(
    app: &mut App,
    config: &ReconConfig,
    progress_tx: &mpsc::UnboundedSender<ProgressEvent>,
    result_tx: &ResultSender,
) {
    let Some(request) = app.request() else {
        return;
    };
    app.start_scan();

    let config = config.clone();
    let progress_tx = progress_tx.clone();
    let result_tx = result_tx.clone();
    tokio::spawn(async move {
        let result = crate::core::scanner::run_recon(&request, &config, Arc::new(SystemRunner), Some(progress_tx))
            .await
            .map_err(|e| {
                error!(error = %e, "Recon run aborted.");
                e.to_string()
            });
        let _ = result_tx.send(result).await;
    });
}
