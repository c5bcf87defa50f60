// Accent palettes for the `theme` setting.
use ratatui::style::Color;

pub const THEMES: [&str; 2] = ["light", "dark"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub secondary: Color,
    pub section: Color,
    pub success: Color,
    pub danger: Color,
    pub muted: Color,
    pub text: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
}

impl Theme {
    pub fn named(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn light() -> Self {
        Self {
            accent: Color::Cyan,
            secondary: Color::LightBlue,
            section: Color::Yellow,
            success: Color::LightGreen,
            danger: Color::LightRed,
            muted: Color::DarkGray,
            text: Color::White,
            selection_fg: Color::Black,
            selection_bg: Color::Cyan,
        }
    }

    pub fn dark() -> Self {
        Self {
            accent: Color::Magenta,
            secondary: Color::LightMagenta,
            section: Color::LightYellow,
            success: Color::Green,
            danger: Color::Red,
            muted: Color::DarkGray,
            text: Color::Gray,
            selection_fg: Color::White,
            selection_bg: Color::Magenta,
        }
    }
}

pub fn next_theme(name: &str) -> &'static str {
    let index = THEMES.iter().position(|theme| *theme == name).unwrap_or(0);
    THEMES[(index + 1) % THEMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_use_light() {
        assert_eq!(Theme::named("solarized"), Theme::light());
        assert_eq!(Theme::named("dark"), Theme::dark());
        assert_eq!(next_theme("light"), "dark");
        assert_eq!(next_theme("dark"), "light");
    }
}
