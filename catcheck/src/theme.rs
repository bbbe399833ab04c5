//! Color themes.
//!
//! `dark` sticks to the ANSI 16 palette and works everywhere; `catppuccin-mocha`
//! is RGB and wants a truecolor terminal.

use catcheck_core::notify::Severity;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panels
    pub border_active: Color,
    pub border_inactive: Color,
    pub tab_active: Color,
    pub selection_bg: Color,
    pub dim: Color,

    // Change markup
    /// Background behind inserted text.
    pub added_bg: Color,
    /// Foreground of struck-through deleted text.
    pub deleted_fg: Color,
    /// Underline color of replaced text.
    pub changed_fg: Color,
    pub caption: Color,

    // Word diff
    pub diff_added: Color,
    pub diff_removed: Color,

    // Notifications
    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,
            tab_active: Color::Cyan,
            selection_bg: Color::DarkGray,
            dim: Color::DarkGray,

            added_bg: Color::Green,
            deleted_fg: Color::Red,
            changed_fg: Color::Yellow,
            caption: Color::DarkGray,

            diff_added: Color::Green,
            diff_removed: Color::Red,

            info: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
        }
    }

    /// Catppuccin Mocha, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387
        let added = Color::Rgb(64, 92, 70);

        Self {
            border_active: lavender,
            border_inactive: overlay1,
            tab_active: lavender,
            selection_bg: surface0,
            dim: overlay1,

            added_bg: added,
            deleted_fg: red,
            changed_fg: peach,
            caption: overlay1,

            diff_added: green,
            diff_removed: red,

            info: blue,
            success: green,
            warning: yellow,
            error: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
        }
    }

    /// Unknown names fall back to `dark` so a config typo never blocks startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!("unknown theme '{}', falling back to 'dark'", other);
                Self::dark()
            }
        }
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Info => self.info,
            Severity::Success => self.success,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }
}
