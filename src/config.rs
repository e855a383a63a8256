use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::theme::{apply_overrides, Theme, ThemeOverrides};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub theme: Theme,
    /// Passed to the diff queries as `-U<n>`.
    pub context_lines: Option<u32>,
    pub recent_commits: usize,
    /// The git executable.
    pub git: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::from_name("one-dark"),
            context_lines: None,
            recent_commits: 10,
            git: "git".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    colors: Option<ThemeOverrides>,
    #[serde(default)]
    context_lines: Option<u32>,
    #[serde(default)]
    recent_commits: Option<usize>,
    #[serde(default)]
    git: Option<String>,
}

fn config_path() -> PathBuf {
    let mut path = dirs_home().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("porcelain");
    path.push("config.toml");
    path
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Default log file: `$XDG_STATE_HOME/porcelain/porcelain.log`, falling back
/// to `~/.local/state`.
pub fn default_log_path() -> PathBuf {
    let mut path = std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs_home().map(|home| home.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("porcelain");
    path.push("porcelain.log");
    path
}

/// Load `~/.config/porcelain/config.toml`, falling back to defaults.
pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> AppConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return AppConfig::default(),
    };
    parse_config(&contents).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "config file ignored");
        AppConfig::default()
    })
}

fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    let file: ConfigFile = toml::from_str(contents)?;
    let defaults = AppConfig::default();

    let theme_name = file.theme.as_deref().unwrap_or("one-dark");
    let mut theme = Theme::from_name(theme_name);
    if let Some(ref overrides) = file.colors {
        apply_overrides(&mut theme, overrides);
    }

    Ok(AppConfig {
        theme,
        context_lines: file.context_lines,
        recent_commits: file.recent_commits.unwrap_or(defaults.recent_commits),
        git: file.git.unwrap_or(defaults.git),
    })
}
