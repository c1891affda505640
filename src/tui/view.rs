use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::mode::Focus;
use super::steps::draw_steps;
use crate::playback::VolumeChannel;
use crate::shared::DisplayState;

const HELP: &str = "Tab focus · Enter generate · Space play/stop · l loop · m mute · [ ] subdiv · - = tempo · 1 2 3 + , . volume · u demo · Esc quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, focus: Focus, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // pattern entry
            Constraint::Length(3), // transport row
            Constraint::Length(5), // clave + metronome rows
            Constraint::Length(1), // bases
            Constraint::Length(1), // message line
            Constraint::Min(1),    // help
        ])
        .split(area);

    draw_entry(frame, sections[0], state, focus == Focus::Entry, blink_on);
    draw_transport(frame, sections[1], state, focus == Focus::Transport);
    draw_steps(frame, sections[2], &state.steps);
    frame.render_widget(
        Paragraph::new(state.bases_text.as_str()).style(Style::default().fg(Color::Cyan)),
        sections[3],
    );
    if let Some(msg) = &state.message {
        frame.render_widget(
            Paragraph::new(msg.as_str()).style(Style::default().fg(Color::LightRed)),
            sections[4],
        );
    }
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[5],
    );
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_entry(frame: &mut Frame, area: Rect, state: &DisplayState, focused: bool, blink_on: bool) {
    let cursor = if focused && blink_on { "▏" } else { " " };
    let block = Block::default()
        .title(" pattern ")
        .borders(Borders::ALL)
        .border_style(focus_style(focused));
    let line = Line::from(vec![
        Span::raw(state.pattern_text.clone()),
        Span::styled(cursor, Style::default().fg(Color::LightMagenta)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState, focused: bool) {
    let block = Block::default()
        .title(" transport ")
        .borders(Borders::ALL)
        .border_style(focus_style(focused));

    let (symbol, label, color) = if state.playing {
        ("▶", "Playing", Color::Green)
    } else {
        ("■", "Stopped", Color::Yellow)
    };
    let flag = |on: bool, name: &'static str| {
        let style = if on {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        };
        Span::styled(format!("{name}  "), style)
    };

    let mut spans = vec![
        Span::styled(format!(" {symbol} {label}  "), Style::default().fg(color)),
        Span::styled(format!("BPM {:.0}  ", state.tempo), Style::default().fg(Color::Cyan)),
        Span::raw(format!("SUB {}  ", state.subdivision)),
        flag(state.looping, "LOOP"),
        flag(!state.metronome_muted, "METRO"),
    ];
    for channel in [VolumeChannel::Master, VolumeChannel::Clave, VolumeChannel::Metronome] {
        let style = if channel == state.selected_volume {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(
            format!("{} {:.2}  ", channel.label(), state.volumes.get(channel)),
            style,
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
