//! Key bindings for interactive triage.
//!
//! | Key    | Active      | ReviewComplete | Idle   |
//! |--------|-------------|----------------|--------|
//! | ←      | Hide        |                |        |
//! | ↓      | Keep        |                |        |
//! | →      | Highlight   |                |        |
//! | ↑      | Previous    |                |        |
//! | Space  | AddSelection|                |        |
//! | Enter  |             | Collect        | start  |
//! | d      |             | Dismiss        |        |
//! | s      |             |                | start  |
//! | c      | cancel      | cancel         |        |
//! | u      | untoggle    | untoggle       | untoggle |
//! | Esc    | Exit        | Exit           | quit   |
//! | q      | quit        | quit           | quit   |
//!
//! Lower-case entries go through the chrome request queue, like the buttons
//! next to the editor would.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use sift_engine::{ChromeRequest, Intent, Phase};

/// What a key press asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Dispatch(Intent),
    Request(ChromeRequest),
    /// Leave the program.
    Quit,
}

/// Map a key event to an action in the given phase.
pub fn action_for(key: KeyEvent, phase: Phase) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Quit);
    }

    use KeyAction::{Dispatch, Request};
    let action = match (phase, key.code) {
        (_, KeyCode::Char('q')) => KeyAction::Quit,
        (_, KeyCode::Char('u')) => Request(ChromeRequest::UntoggleAll),
        (Phase::Idle, KeyCode::Esc) => KeyAction::Quit,
        (_, KeyCode::Esc) => Dispatch(Intent::Exit),
        (Phase::Idle, KeyCode::Char('s') | KeyCode::Enter) => Request(ChromeRequest::Start),
        (Phase::Idle, _) => return None,
        (_, KeyCode::Char('c')) => Request(ChromeRequest::Cancel),

        (Phase::Active, KeyCode::Left) => Dispatch(Intent::Hide),
        (Phase::Active, KeyCode::Down) => Dispatch(Intent::Keep),
        (Phase::Active, KeyCode::Right) => Dispatch(Intent::Highlight),
        (Phase::Active, KeyCode::Up) => Dispatch(Intent::Previous),
        (Phase::Active, KeyCode::Char(' ')) => Dispatch(Intent::AddSelection),

        (Phase::ReviewComplete, KeyCode::Enter) => Dispatch(Intent::Collect),
        (Phase::ReviewComplete, KeyCode::Char('d')) => Dispatch(Intent::Dismiss),

        _ => return None,
    };
    Some(action)
}

/// One-line hint for the status bar.
pub fn help_line(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "s/enter start · u untoggle all · q quit",
        Phase::Active => "← hide · ↓ keep · → highlight · ↑ back · space select · c cancel · esc exit",
        Phase::ReviewComplete => "enter collect · d dismiss · c cancel · esc exit",
    }
}
