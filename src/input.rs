use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Press,
    Release,
    Start,
    Stop,
    Reset,
    Quit,
}

/// Translates terminal key events into game commands.
///
/// Space is the breathing key. Terminals that report key releases give a
/// real hold; elsewhere `toggle` makes each press flip between held and
/// released.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    toggle: bool,
    toggled_down: bool,
}

impl KeyMap {
    pub fn new(toggle: bool) -> Self {
        Self {
            toggle,
            toggled_down: false,
        }
    }

    pub fn is_toggle(&self) -> bool {
        self.toggle
    }

    pub fn map(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        match (key.code, key.kind) {
            (KeyCode::Char(' '), KeyEventKind::Press) if self.toggle => {
                self.toggled_down = !self.toggled_down;
                Some(if self.toggled_down {
                    Command::Press
                } else {
                    Command::Release
                })
            }
            (KeyCode::Char(' '), _) if self.toggle => None,
            (KeyCode::Char(' '), KeyEventKind::Press | KeyEventKind::Repeat) => {
                Some(Command::Press)
            }
            (KeyCode::Char(' '), KeyEventKind::Release) => Some(Command::Release),
            (_, KeyEventKind::Release) => None,
            (KeyCode::Esc, _) => Some(Command::Quit),
            (KeyCode::Char('s'), _) => {
                self.toggled_down = false;
                Some(Command::Start)
            }
            (KeyCode::Char('x'), _) => Some(Command::Stop),
            (KeyCode::Char('r'), _) => {
                self.toggled_down = false;
                Some(Command::Reset)
            }
            _ => None,
        }
    }
}

/// Apply a command to the session. Returns false when the app should quit.
pub fn apply(session: &mut Session, command: Command) -> bool {
    match command {
        Command::Press => session.on_raw_input_down(),
        Command::Release => session.on_raw_input_up(),
        Command::Start => session.start(),
        Command::Stop => session.stop(),
        Command::Reset => session.reset(),
        Command::Quit => {
            session.stop();
            return false;
        }
    }
    true
}
