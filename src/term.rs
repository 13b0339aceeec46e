//! Raw-mode single-key input for the trace prompts.

use std::io::{self, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Other,
}

fn enable_raw_mode() {
    terminal::enable_raw_mode().expect("failed to enable raw terminal");
}

fn disable_raw_mode() {
    terminal::disable_raw_mode().expect("failed to disable raw terminal");
}

/// Blocks until a key press arrives.
fn read_key() -> Key {
    loop {
        let Ok(ev) = event::read() else {
            return Key::Other;
        };
        if let Event::Key(key) = ev {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            return match key.code {
                KeyCode::Char(c) => Key::Char(c.to_ascii_lowercase()),
                KeyCode::Enter => Key::Enter,
                _ => Key::Other,
            };
        }
    }
}

/// Reads one key in raw mode, echoes it, and returns it lowercased.
pub fn read_single_key() -> Key {
    io::stdout().flush().ok();
    enable_raw_mode();
    let key = read_key();
    disable_raw_mode();
    if let Key::Char(c) = key {
        print!("{c}");
        io::stdout().flush().ok();
    }
    key
}
