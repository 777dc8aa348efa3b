use colored::Color;

/// CLI color theme configuration
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub muted: Color,
}

pub const THEME: ColorTheme = ColorTheme {
    success: Color::Green,
    error: Color::Red,
    warning: Color::Yellow,
    info: Color::Blue,
    muted: Color::BrightBlack,
};

pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub like: &'static str,
    pub dislike: &'static str,
    pub share: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    like: "▲",
    dislike: "▼",
    share: "↻",
};
