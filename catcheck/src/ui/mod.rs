//! Rendering. [`render`] is the only function the event loop calls inside
//! `terminal.draw()`.

mod backlog;
mod data;
mod layout;
mod markup;
mod results;
mod review;

pub mod help;
pub mod keybindings;

use ratatui::Frame;

use crate::app::{AppState, Mode, Tab};
use crate::theme::Theme;
use layout::{compute_layout, render_status_bar, render_tabs};

pub fn render(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let [tabs, main, status_bar] = compute_layout(frame.area());

    render_tabs(frame, tabs, state, theme);
    match state.tab {
        Tab::Results => results::render_results(frame, main, state, theme),
        Tab::Review => review::render_review(frame, main, state, theme),
        Tab::Data => data::render_data(frame, main, state, theme),
        Tab::Backlog => backlog::render_backlog(frame, main, state, theme),
    }
    render_status_bar(frame, status_bar, state, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
