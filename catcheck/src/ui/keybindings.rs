//! Key dispatcher.
//!
//! Branches on `state.mode` first; text-input modes own every key. In Normal
//! mode the active tab gets the first look at a key, then the global bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{AppState, Mode, Tab};

/// What the event loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::EditCard | Mode::EditDocument | Mode::Feedback | Mode::SheetInput => {
            handle_text_input(key, state)
        }
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let consumed = match state.tab {
        Tab::Results => handle_results_key(key, state),
        Tab::Review => handle_review_key(key, state),
        Tab::Data => handle_data_key(key, state),
        Tab::Backlog => handle_backlog_key(key, state),
    };
    if consumed {
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Tab => state.tab = state.tab.next(),
        KeyCode::BackTab => state.tab = state.tab.prev(),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            state.tab = Tab::ALL[index];
        }

        KeyCode::Char('s') => state.begin_sheet_input(),
        KeyCode::Char('R') => state.reload_sheet(),
        KeyCode::Char('p') => state.cycle_product_column(true),
        KeyCode::Char('P') => state.cycle_product_column(false),
        KeyCode::Char('c') => state.cycle_analysis_column(true),
        KeyCode::Char('C') => state.cycle_analysis_column(false),
        KeyCode::Char('a') => state.cycle_assistant(true),
        KeyCode::Char('A') => state.cycle_assistant(false),
        KeyCode::Char('r') => state.run_analysis(),
        KeyCode::Char('x') => state.stop_analysis(),
        KeyCode::Char('L') => state.load_last_responses(1),
        KeyCode::Char('b') => state.reload_backlog(),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') => {
            if state.has_work_in_flight() {
                state.mode = Mode::ConfirmQuit;
            } else {
                return KeyAction::Quit;
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Returns `true` when the key was consumed.
fn handle_results_key(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.select_prev(),
        KeyCode::Char('J') => state.detail_scroll = state.detail_scroll.saturating_add(1),
        KeyCode::Char('K') => state.detail_scroll = state.detail_scroll.saturating_sub(1),
        KeyCode::Char('m') => state.load_more(),
        KeyCode::Char('>') => state.next_page(),
        KeyCode::Char('<') => state.prev_page(),
        KeyCode::Char('e') => state.begin_edit(),
        KeyCode::Char('y') => state.confirm_selected(),
        KeyCode::Char('n') => state.reject_selected(),
        KeyCode::Char('f') => state.begin_feedback(),
        KeyCode::Char('v') | KeyCode::Enter => state.open_review(),
        _ => return false,
    }
    true
}

fn handle_review_key(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.review_select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.review_select_prev(),
        KeyCode::Char('y') | KeyCode::Enter => state.review_accept(),
        KeyCode::Char('n') => state.review_reject(),
        KeyCode::Char('u') => state.review_undo(),
        KeyCode::Char('e') => state.begin_document_edit(),
        KeyCode::Char('w') => state.apply_review_to_card(),
        KeyCode::Esc => state.tab = Tab::Results,
        _ => return false,
    }
    true
}

fn handle_data_key(key: KeyEvent, state: &mut AppState) -> bool {
    let last = state.sheet_rows().saturating_sub(1);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.data_scroll = (state.data_scroll + 1).min(last),
        KeyCode::Char('k') | KeyCode::Up => state.data_scroll = state.data_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.data_scroll = 0,
        KeyCode::Char('G') => state.data_scroll = last,
        _ => return false,
    }
    true
}

fn handle_backlog_key(key: KeyEvent, state: &mut AppState) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.backlog_scroll = state.backlog_scroll.saturating_add(1)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.backlog_scroll = state.backlog_scroll.saturating_sub(1)
        }
        KeyCode::Char('g') => state.backlog_scroll = 0,
        _ => return false,
    }
    true
}

// ---------------------------------------------------------------------------
// Text input modes
// ---------------------------------------------------------------------------

fn handle_text_input(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let multiline = matches!(state.mode, Mode::EditCard | Mode::EditDocument);

    match key.code {
        KeyCode::Esc => match state.mode {
            Mode::EditCard => state.cancel_edit(),
            _ => state.cancel_input(),
        },
        KeyCode::Char('s') if ctrl && multiline => match state.mode {
            Mode::EditCard => state.save_edit(),
            _ => state.commit_document_edit(),
        },
        KeyCode::Enter if multiline => push_char(state, '\n'),
        KeyCode::Down | KeyCode::Tab if state.mode == Mode::SheetInput => {
            state.cycle_saved_sheet(true)
        }
        KeyCode::Up | KeyCode::BackTab if state.mode == Mode::SheetInput => {
            state.cycle_saved_sheet(false)
        }
        KeyCode::Enter => match state.mode {
            Mode::Feedback => state.submit_feedback(),
            _ => state.submit_sheet_input(),
        },
        KeyCode::Backspace => {
            if let Some(buffer) = state.input_buffer_mut() {
                buffer.pop();
            }
        }
        KeyCode::Char(c) if !ctrl => push_char(state, c),
        _ => {}
    }
    KeyAction::Continue
}

fn push_char(state: &mut AppState, c: char) {
    if let Some(buffer) = state.input_buffer_mut() {
        buffer.push(c);
    }
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1)
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Mouse
// ---------------------------------------------------------------------------

/// Wheel scrolling moves the selection of the active page.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    if state.mode != Mode::Normal {
        return;
    }
    let code = match mouse.kind {
        MouseEventKind::ScrollDown => KeyCode::Down,
        MouseEventKind::ScrollUp => KeyCode::Up,
        _ => return,
    };
    handle_normal(KeyEvent::new(code, KeyModifiers::NONE), state);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use catcheck_core::config::Config;
    use catcheck_core::notify::RecordingNotifier;

    use super::*;
    use crate::api::ApiRequest;

    fn state() -> AppState {
        AppState::new(&Config::default(), Arc::new(RecordingNotifier::new()))
    }

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    fn ctrl(state: &mut AppState, c: char) -> KeyAction {
        handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL), state)
    }

    #[test]
    fn q_quits_when_idle() {
        let mut s = state();
        assert_eq!(press(&mut s, KeyCode::Char('q')), KeyAction::Quit);
    }

    #[test]
    fn q_asks_while_analysis_runs() {
        let mut s = state();
        s.analysis_loading = true;
        assert_eq!(press(&mut s, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(s.mode, Mode::ConfirmQuit);
        assert_eq!(press(&mut s, KeyCode::Char('n')), KeyAction::Continue);
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn tabs_cycle_and_jump() {
        let mut s = state();
        press(&mut s, KeyCode::Tab);
        assert_eq!(s.tab, Tab::Review);
        press(&mut s, KeyCode::BackTab);
        press(&mut s, KeyCode::BackTab);
        assert_eq!(s.tab, Tab::Backlog);
        press(&mut s, KeyCode::Char('3'));
        assert_eq!(s.tab, Tab::Data);
    }

    #[test]
    fn sheet_input_collects_text_until_enter() {
        let mut s = state();
        press(&mut s, KeyCode::Char('s'));
        assert_eq!(s.mode, Mode::SheetInput);
        for c in "abcx".chars() {
            press(&mut s, KeyCode::Char(c));
        }
        press(&mut s, KeyCode::Backspace);
        // Global bindings are inert while typing.
        press(&mut s, KeyCode::Char('q'));
        press(&mut s, KeyCode::Enter);

        assert_eq!(s.mode, Mode::Normal);
        assert_eq!(s.sheet_id.as_deref(), Some("abcq"));
        assert!(matches!(
            s.take_requests().as_slice(),
            [ApiRequest::LoadSheet { quiet: false, .. }]
        ));
    }

    #[test]
    fn ctrl_s_is_not_typed_into_the_sheet_id() {
        let mut s = state();
        press(&mut s, KeyCode::Char('s'));
        ctrl(&mut s, 's');
        assert_eq!(s.mode, Mode::SheetInput);
        assert!(s.input.is_empty());
    }

    #[test]
    fn help_toggles() {
        let mut s = state();
        press(&mut s, KeyCode::Char('?'));
        assert_eq!(s.mode, Mode::HelpOverlay);
        press(&mut s, KeyCode::Char('j'));
        assert_eq!(s.help_scroll, 1);
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn escape_leaves_review_tab() {
        let mut s = state();
        s.tab = Tab::Review;
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.tab, Tab::Results);
    }
}
