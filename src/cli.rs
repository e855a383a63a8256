use clap::Parser;
use std::path::PathBuf;

use porcelain::popup::PopupKind;

#[derive(Parser, Debug)]
#[command(
    name = "porcelain",
    version,
    about = "Terminal git porcelain with popups and line-level staging"
)]
pub struct Cli {
    /// Open a popup directly (e.g. push, log, branch)
    #[arg(long, value_parser = parse_popup)]
    pub popup: Option<PopupKind>,

    /// Write logs to this file instead of the default state directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log debug output from the core
    #[arg(short, long)]
    pub verbose: bool,

    /// Color theme (one-dark, github-dark, dracula, solarized-dark)
    #[arg(long)]
    pub theme: Option<String>,
}

fn parse_popup(name: &str) -> Result<PopupKind, String> {
    name.parse::<PopupKind>().map_err(|err| err.to_string())
}
