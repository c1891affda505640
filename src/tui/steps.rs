use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::scheduler::Visualizer;
use crate::sequence::{MetronomeSequence, StepSequence};

const CLAVE_ON: &str = "●";
const METRO_ON: &str = "◆";
const OFF: &str = "○";
const LABEL_WIDTH: usize = 7;

/// Latest picture pushed by the transport. Drawn every frame, so a terminal
/// resize just redraws it.
#[derive(Clone, Debug, Default)]
pub struct StepView {
    pub clave: StepSequence,
    pub metronome: MetronomeSequence,
    pub highlight: Option<usize>,
}

impl Visualizer for StepView {
    fn render(
        &mut self,
        clave: &StepSequence,
        metronome: &MetronomeSequence,
        highlight: Option<usize>,
    ) {
        self.clave = clave.clone();
        self.metronome = metronome.clone();
        self.highlight = highlight;
    }
}

pub fn draw_steps(frame: &mut Frame, area: Rect, view: &StepView) {
    let block = Block::default().title(" clave ").borders(Borders::ALL);
    let inner_width = area.width.saturating_sub(2) as usize;

    if view.clave.is_empty() {
        let hint = Paragraph::new("Type onset counts (e.g. 3 3 2) and press Enter")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    // two columns per step; long sequences scroll to keep the playhead visible
    let visible = (inner_width.saturating_sub(LABEL_WIDTH) / 2).max(1);
    let first = view
        .highlight
        .map(|h| (h / visible) * visible)
        .unwrap_or(0);
    let range = first..(first + visible).min(view.clave.len());

    let clave = row(
        "clave",
        range.clone(),
        |i| view.clave.is_on(i),
        CLAVE_ON,
        Color::White,
        view.highlight,
    );
    let metro = row(
        "metro",
        range.clone(),
        |i| view.metronome.is_on(i),
        METRO_ON,
        Color::Red,
        view.highlight,
    );
    let ruler = ruler(range, view.highlight);

    frame.render_widget(Paragraph::new(vec![clave, metro, ruler]).block(block), area);
}

fn row(
    label: &str,
    range: std::ops::Range<usize>,
    is_on: impl Fn(usize) -> bool,
    on_glyph: &'static str,
    on_color: Color,
    highlight: Option<usize>,
) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{label:<LABEL_WIDTH$}"),
        Style::default().fg(Color::DarkGray),
    )];
    for i in range {
        let on = is_on(i);
        // only a sounding step lights up
        let style = match (on, highlight == Some(i)) {
            (true, true) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(on_color),
            (false, _) => Style::default().fg(Color::DarkGray),
        };
        spans.push(Span::styled(if on { on_glyph } else { OFF }, style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn ruler(range: std::ops::Range<usize>, highlight: Option<usize>) -> Line<'static> {
    let mut text = " ".repeat(LABEL_WIDTH);
    for i in range {
        text.push_str(if highlight == Some(i) { "▲ " } else { "  " });
    }
    Line::from(Span::styled(text, Style::default().fg(Color::Yellow)))
}
