use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::{Focus, TuiState};
use crate::playback::VolumeChannel;
use crate::shared::InputEvent;

// poll for a key, resolve it against the current focus into input events
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Tab => {
            ts.focus = ts.focus.next();
            vec![]
        }
        KeyCode::Enter => vec![InputEvent::Submit],
        _ => match ts.focus {
            Focus::Entry => resolve_entry(code),
            Focus::Transport => resolve_transport(code),
        },
    }
}

// typing into the pattern field: digits and separators only
fn resolve_entry(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Char(c) if c.is_ascii_digit() || c == ' ' => vec![InputEvent::EntryChar(c)],
        KeyCode::Backspace => vec![InputEvent::EntryBackspace],
        _ => vec![],
    }
}

fn resolve_transport(code: KeyCode) -> Vec<InputEvent> {
    let event = match code {
        KeyCode::Char(' ') => InputEvent::PlayPress,
        KeyCode::Char('l') => InputEvent::ToggleLoop,
        KeyCode::Char('m') => InputEvent::ToggleMute,
        KeyCode::Char('[') => InputEvent::SubdivisionDown,
        KeyCode::Char(']') => InputEvent::SubdivisionUp,
        KeyCode::Char('-') => InputEvent::TempoDown,
        KeyCode::Char('=') => InputEvent::TempoUp,
        KeyCode::Char('1') => InputEvent::SelectVolume(VolumeChannel::Master),
        KeyCode::Char('2') => InputEvent::SelectVolume(VolumeChannel::Clave),
        KeyCode::Char('3') => InputEvent::SelectVolume(VolumeChannel::Metronome),
        KeyCode::Char(',') => InputEvent::VolumeDown,
        KeyCode::Char('.') => InputEvent::VolumeUp,
        KeyCode::Char('u') => InputEvent::GenerateUniform,
        _ => return vec![],
    };
    vec![event]
}
