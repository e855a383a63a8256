use anyhow::Result;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::path::Path;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode on the alternate screen, titled after the working tree.
pub fn init(workdir: &Path) -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, SetTitle(window_title(workdir)))?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
/// Every step runs; the first failure is reported afterwards.
pub fn restore() -> Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(io::stdout(), LeaveAlternateScreen, Show);
    raw?;
    screen?;
    Ok(())
}

/// Hand the shell back before the panic message is printed.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        default_hook(panic_info);
    }));
}

fn window_title(workdir: &Path) -> String {
    match workdir.file_name() {
        Some(name) => format!("porcelain: {}", name.to_string_lossy()),
        None => "porcelain".to_string(),
    }
}
