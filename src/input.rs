//! Key bindings: arrows plus vim-style aliases, and the game-over name prompt.

use crate::game::Movement;
use crate::leaderboard::NAME_MAX_LEN;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    Pause,
    Quit,
    None,
}

impl Action {
    /// Engine move for this action, if it is one.
    pub fn movement(self) -> Option<Movement> {
        match self {
            Self::MoveLeft => Some(Movement::left()),
            Self::MoveRight => Some(Movement::right()),
            Self::Rotate => Some(Movement::rotate()),
            Self::SoftDrop => Some(Movement::down()),
            Self::Pause | Self::Quit | Self::None => None,
        }
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c')
}

/// Map key event to game action. Supports both arrows and vim keys (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    if is_ctrl_c(&key) {
        return Action::Quit;
    }
    let KeyEvent { code, modifiers, .. } = key;
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        _ => Action::None,
    }
}

/// Effect of a key on the name prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEdit {
    Edited,
    Submit,
    Cancel,
    Quit,
    Ignored,
}

/// Apply a key to the name being typed. Enter on a blank name is ignored.
pub fn edit_name(name: &mut String, key: KeyEvent) -> NameEdit {
    if is_ctrl_c(&key) {
        return NameEdit::Quit;
    }
    match key.code {
        KeyCode::Enter if name.trim().is_empty() => NameEdit::Ignored,
        KeyCode::Enter => NameEdit::Submit,
        KeyCode::Esc => NameEdit::Cancel,
        KeyCode::Backspace => {
            if name.pop().is_some() {
                NameEdit::Edited
            } else {
                NameEdit::Ignored
            }
        }
        KeyCode::Char(c)
            if !c.is_control()
                && !key.modifiers.contains(KeyModifiers::CONTROL)
                && name.chars().count() < NAME_MAX_LEN =>
        {
            name.push(c);
            NameEdit::Edited
        }
        _ => NameEdit::Ignored,
    }
}
