use std::io::{self, IsTerminal};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// q, Esc and Ctrl-C stop the running job. Raw mode swallows SIGINT, hence Ctrl-C.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Raw-mode keyboard watch for the duration of a job. Restores the terminal on drop.
pub struct KeyWatch {
    _raw: (),
}

impl KeyWatch {
    /// None when stdin is not a terminal or raw mode is unavailable.
    pub fn enable() -> Option<Self> {
        if !io::stdin().is_terminal() {
            return None;
        }
        enable_raw_mode().ok()?;
        Some(Self { _raw: () })
    }

    /// Drain pending input; true if a quit key was among it.
    pub fn quit_requested(&self) -> io::Result<bool> {
        let mut quit = false;
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                quit |= is_quit_key(&key);
            }
        }
        Ok(quit)
    }
}

impl Drop for KeyWatch {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}
