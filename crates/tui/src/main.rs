//! UserAuth TUI - login and signup in the terminal
//!
//! This is the main entry point. It loads the config, opens the user store,
//! wires the Google identity provider, and runs the app.

mod app;
mod event;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use common::Config;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use identity::{GoogleIdentity, SessionStorage};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};
use user_store::SqliteUserStore;

#[derive(Parser, Debug)]
#[command(name = "userauth", version, about = "Sign in or create an account")]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "USERAUTH_CONFIG")]
    config: Option<PathBuf>,

    /// User database file, overriding the config
    #[arg(long, env = "USERAUTH_DATABASE")]
    database: Option<PathBuf>,
}

/// Initialize logging to file (not stdout, since we're using the terminal)
fn init_logging(config: &common::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file = config.resolved_file().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        std::fs::OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let writer = match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_logging(&config.logging);

    let db_path = args
        .database
        .or_else(|| config.database.resolved_path())
        .context("Could not determine a database location; pass --database")?;
    let store = Arc::new(SqliteUserStore::open(&db_path)?);
    info!("Using user database at {}", db_path.display());

    let storage = SessionStorage::from_default_path()?;
    let google_configured = config.google.is_configured();
    let identity = Arc::new(GoogleIdentity::new(config.google, storage));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, identity, google_configured);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}
