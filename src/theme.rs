use ratatui::style::Color;
use serde::Deserialize;

/// Semantic color slots for the status view, popups and dialogs.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // General UI
    pub accent: Color,
    pub secondary: Color,
    pub text: Color,
    pub text_muted: Color,
    pub surface: Color,
    pub selection_bg: Color,
    pub visual_select_bg: Color,

    // Diff
    pub diff_add_bg: Color,
    pub diff_del_bg: Color,
    pub diff_add_fg: Color,
    pub diff_del_fg: Color,
    pub diff_context_fg: Color,
    pub diff_hunk_header_fg: Color,

    // Popups
    pub key_fg: Color,
    pub flag_fg: Color,

    // Status indicators
    pub success: Color,
    pub error: Color,
    pub warning: Color,
}

pub const THEME_NAMES: &[&str] = &["one-dark", "github-dark", "dracula", "solarized-dark"];

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "github-dark" => github_dark(),
            "dracula" => dracula(),
            "solarized-dark" => solarized_dark(),
            other => {
                if other != "one-dark" {
                    tracing::warn!(theme = other, known = ?THEME_NAMES, "unknown theme, using one-dark");
                }
                one_dark()
            }
        }
    }
}

pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// `[colors]` table of the config file. Every slot is optional.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ThemeOverrides {
    pub accent: Option<String>,
    pub secondary: Option<String>,
    pub text: Option<String>,
    pub text_muted: Option<String>,
    pub surface: Option<String>,
    pub selection_bg: Option<String>,
    pub visual_select_bg: Option<String>,
    pub diff_add_bg: Option<String>,
    pub diff_del_bg: Option<String>,
    pub diff_add_fg: Option<String>,
    pub diff_del_fg: Option<String>,
    pub diff_context_fg: Option<String>,
    pub diff_hunk_header_fg: Option<String>,
    pub key_fg: Option<String>,
    pub flag_fg: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

pub fn apply_overrides(theme: &mut Theme, overrides: &ThemeOverrides) {
    macro_rules! apply {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(ref hex) = overrides.$field {
                    match parse_hex_color(hex) {
                        Some(color) => theme.$field = color,
                        None => tracing::warn!(slot = stringify!($field), %hex, "ignoring invalid color"),
                    }
                }
            )*
        };
    }
    apply!(
        accent,
        secondary,
        text,
        text_muted,
        surface,
        selection_bg,
        visual_select_bg,
        diff_add_bg,
        diff_del_bg,
        diff_add_fg,
        diff_del_fg,
        diff_context_fg,
        diff_hunk_header_fg,
        key_fg,
        flag_fg,
        success,
        error,
        warning,
    );
}

fn one_dark() -> Theme {
    Theme {
        name: "one-dark".to_string(),
        accent: Color::Cyan,
        secondary: Color::Magenta,
        text: Color::White,
        text_muted: Color::DarkGray,
        surface: Color::Rgb(30, 30, 30),
        selection_bg: Color::Rgb(40, 40, 50),
        visual_select_bg: Color::Rgb(70, 50, 100),
        diff_add_bg: Color::Rgb(0, 30, 0),
        diff_del_bg: Color::Rgb(40, 0, 0),
        diff_add_fg: Color::Green,
        diff_del_fg: Color::Red,
        diff_context_fg: Color::Rgb(171, 178, 191),
        diff_hunk_header_fg: Color::Magenta,
        key_fg: Color::Rgb(198, 120, 221),
        flag_fg: Color::Rgb(97, 175, 239),
        success: Color::Green,
        error: Color::Red,
        warning: Color::Yellow,
    }
}

fn github_dark() -> Theme {
    Theme {
        name: "github-dark".to_string(),
        accent: Color::Rgb(88, 166, 255),
        secondary: Color::Rgb(188, 140, 255),
        text: Color::Rgb(230, 237, 243),
        text_muted: Color::Rgb(125, 133, 144),
        surface: Color::Rgb(22, 27, 34),
        selection_bg: Color::Rgb(38, 50, 72),
        visual_select_bg: Color::Rgb(50, 60, 90),
        diff_add_bg: Color::Rgb(18, 40, 24),
        diff_del_bg: Color::Rgb(50, 18, 18),
        diff_add_fg: Color::Rgb(63, 185, 80),
        diff_del_fg: Color::Rgb(248, 81, 73),
        diff_context_fg: Color::Rgb(230, 237, 243),
        diff_hunk_header_fg: Color::Rgb(188, 140, 255),
        key_fg: Color::Rgb(255, 123, 114),
        flag_fg: Color::Rgb(121, 192, 255),
        success: Color::Rgb(63, 185, 80),
        error: Color::Rgb(248, 81, 73),
        warning: Color::Rgb(210, 153, 34),
    }
}

fn dracula() -> Theme {
    Theme {
        name: "dracula".to_string(),
        accent: Color::Rgb(139, 233, 253),
        secondary: Color::Rgb(255, 121, 198),
        text: Color::Rgb(248, 248, 242),
        text_muted: Color::Rgb(98, 114, 164),
        surface: Color::Rgb(40, 42, 54),
        selection_bg: Color::Rgb(68, 71, 90),
        visual_select_bg: Color::Rgb(80, 60, 120),
        diff_add_bg: Color::Rgb(15, 40, 15),
        diff_del_bg: Color::Rgb(45, 10, 10),
        diff_add_fg: Color::Rgb(80, 250, 123),
        diff_del_fg: Color::Rgb(255, 85, 85),
        diff_context_fg: Color::Rgb(248, 248, 242),
        diff_hunk_header_fg: Color::Rgb(255, 121, 198),
        key_fg: Color::Rgb(255, 121, 198),
        flag_fg: Color::Rgb(189, 147, 249),
        success: Color::Rgb(80, 250, 123),
        error: Color::Rgb(255, 85, 85),
        warning: Color::Rgb(241, 250, 140),
    }
}

fn solarized_dark() -> Theme {
    Theme {
        name: "solarized-dark".to_string(),
        accent: Color::Rgb(38, 139, 210),
        secondary: Color::Rgb(211, 54, 130),
        text: Color::Rgb(147, 161, 161),
        text_muted: Color::Rgb(88, 110, 117),
        surface: Color::Rgb(0, 34, 43),
        selection_bg: Color::Rgb(7, 54, 66),
        visual_select_bg: Color::Rgb(30, 60, 80),
        diff_add_bg: Color::Rgb(0, 30, 10),
        diff_del_bg: Color::Rgb(40, 5, 5),
        diff_add_fg: Color::Rgb(133, 153, 0),
        diff_del_fg: Color::Rgb(220, 50, 47),
        diff_context_fg: Color::Rgb(147, 161, 161),
        diff_hunk_header_fg: Color::Rgb(211, 54, 130),
        key_fg: Color::Rgb(203, 75, 22),
        flag_fg: Color::Rgb(42, 161, 152),
        success: Color::Rgb(133, 153, 0),
        error: Color::Rgb(220, 50, 47),
        warning: Color::Rgb(181, 137, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(parse_hex_color("#ff0080"), Some(Color::Rgb(255, 0, 128)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn overrides_replace_only_valid_slots() {
        let mut theme = Theme::from_name("dracula");
        let overrides = ThemeOverrides {
            accent: Some("#010203".into()),
            error: Some("not-a-color".into()),
            ..Default::default()
        };
        apply_overrides(&mut theme, &overrides);
        assert_eq!(theme.accent, Color::Rgb(1, 2, 3));
        assert_eq!(theme.error, Color::Rgb(255, 85, 85));
    }

    #[test]
    fn every_listed_theme_resolves_to_itself() {
        for name in THEME_NAMES {
            assert_eq!(Theme::from_name(name).name, *name);
        }
    }
}
