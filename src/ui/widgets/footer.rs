// src/ui/widgets/footer.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer line listing the keys valid in the current state.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.state {
        AppState::Disclaimer => Line::from(vec![
            key("Enter"),
            Span::raw(" to acknowledge, "),
            key("Q"),
            Span::raw(" to quit."),
        ]),
        AppState::Idle => Line::from(vec![
            key("Enter"),
            Span::raw(" to scan, "),
            key("Tab"),
            Span::raw(" next field, "),
            key("Esc"),
            Span::raw(" to quit."),
        ]),
        AppState::Scanning => Line::from(vec![
            Span::raw("Scanning... "),
            key("[L]"),
            Span::raw("ogs, "),
            key("[Q]"),
            Span::raw("uit"),
        ]),
        AppState::Finished => Line::from(vec![
            key("[N]"),
            Span::raw("ew Scan, "),
            key("[L]"),
            Span::raw("ogs, "),
            key("[Q]"),
            Span::raw("uit"),
        ]),
    };

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
