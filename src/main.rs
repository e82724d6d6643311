mod api;
mod app;
mod composer;
mod config;
mod history;
mod models;
mod secrets;
mod settings;
mod stats;
mod store;
mod ui;

use crate::api::{ApiClient, Backend};
use crate::app::{App, Command};
use crate::config::{CONFIG_PATH, Config};
use crate::secrets::{RingStorage, SecretStore};
use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const LOG_FILE: &str = "egtui_debug.log";

fn init_logging() -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("Failed to open {}", LOG_FILE))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The terminal owns stdout, so logs only go to a file, and only on request
    if std::env::args().any(|arg| arg == "--debug") {
        init_logging()?;
    }

    let config = Config::load();
    let client = ApiClient::new(&config.api.base_url);
    info!(base_url = client.base_url(), "starting");

    if std::env::args().any(|arg| arg == "--reset-password") {
        RingStorage.clear_password()?;
        println!("Stored SMTP password cleared.");
        return Ok(());
    }

    if std::env::args().any(|arg| arg == "--health") {
        return match client.health().await {
            Ok(()) => {
                println!("{} is healthy", client.base_url());
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!(e).context("Backend health check failed")),
        };
    }

    let backend: Arc<dyn Backend> = Arc::new(client);
    let mut app = App::new(
        backend,
        Box::new(RingStorage),
        config,
        PathBuf::from(CONFIG_PATH),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    let result = run(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        error!("exiting with error: {:#}", e);
    }
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    terminal.hide_cursor()?;

    if let Err(e) = app.backend.health().await {
        error!("Backend health check failed: {}", e);
        app.set_status(format!("Backend unreachable at {}", app.config.api.base_url));
    }
    dispatch(terminal, app, Command::Refresh).await?;

    while !app.should_quit {
        terminal.draw(|f| ui::render(f, app))?;

        if !event::poll(std::time::Duration::from_millis(250))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(command) = app.handle_key(key) {
                dispatch(terminal, app, command).await?;
            }
        }
    }

    Ok(())
}

/// Shows the pending label, then awaits the command before taking more input.
async fn dispatch(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command: Command,
) -> anyhow::Result<()> {
    app.pending = Some(command.pending_label());
    terminal.draw(|f| ui::render(f, app))?;
    app.execute(command).await;
    Ok(())
}
