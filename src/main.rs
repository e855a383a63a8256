mod action;
mod app;
mod cli;
mod components;
mod config;
mod event;
mod session;
mod state;
mod theme;
mod tui;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use porcelain::git::RepoLocation;

use crate::app::App;
use crate::cli::Cli;
use crate::session::Session;
use crate::theme::Theme;

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::from_default_env().add_directive(format!("porcelain={level}").parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install().ok();
    tui::install_panic_hook();

    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(config::default_log_path);
    init_logging(&log_path, cli.verbose)?;

    let cwd = env::current_dir()?;

    // Validate we're in a git repo before launching TUI
    let repo = match RepoLocation::discover(&cwd) {
        Ok(r) => r,
        Err(err) => {
            eprintln!(
                "porcelain: {err:#}\n\
                 Run this command from inside a git working tree."
            );
            std::process::exit(1);
        }
    };
    tracing::info!(workdir = %repo.workdir().display(), "starting");

    // Load config, apply CLI overrides
    let mut config = config::load_config();
    if let Some(ref theme_name) = cli.theme {
        config.theme = Theme::from_name(theme_name);
    }

    let session = Session::load(repo.workdir(), &config)?;
    let mut app = App::new(session, &config, cli.popup);

    let mut terminal = tui::init(repo.workdir())?;
    let result = app.run(&mut terminal).await;
    tui::restore()?;

    if let Err(ref e) = result {
        tracing::error!("{e:#}");
        eprintln!("porcelain: {e:#}");
    }

    result
}
