// src/ui/widgets/log_view.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation},
};

/// Colour for the level column of a log line.
fn level_style(level: &str) -> Style {
    match level.trim() {
        "ERROR" => Style::default().fg(Color::Red),
        "WARN" => Style::default().fg(Color::Yellow),
        "INFO" => Style::default().fg(Color::Green),
        "DEBUG" | "TRACE" => Style::default().fg(Color::Blue),
        _ => Style::default(),
    }
}

/// Renders the tail of the log file, following the run as it writes.
///
/// Lines look like `2024-03-09 14:05:07  INFO message`; the timestamp is dimmed
/// and the level coloured. Long lines scroll horizontally with the arrow keys.
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title("Logs (scroll with ← →)")
        .borders(Borders::ALL);
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let max_width = app.log_content.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    app.log_horizontal_scroll_state = app.log_horizontal_scroll_state.content_length(max_width);

    // Newest lines at the bottom of the panel.
    let visible = inner_area.height.saturating_sub(1) as usize;
    let skip = app.log_content.len().saturating_sub(visible);

    let log_lines: Vec<Line> = app.log_content[skip..]
        .iter()
        .map(|line_str| {
            let mut parts = line_str.splitn(3, ' ');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(date), Some(time), Some(rest)) => {
                    let rest = rest.trim_start();
                    let (level, message) = rest.split_once(' ').unwrap_or((rest, ""));
                    Line::from(vec![
                        Span::styled(format!("{} {} ", date, time), Style::default().fg(Color::DarkGray)),
                        Span::styled(level.to_string(), level_style(level)),
                        Span::raw(format!(" {}", message)),
                    ])
                }
                _ => Line::from(line_str.as_str()),
            }
        })
        .collect();

    let log_paragraph = Paragraph::new(log_lines).scroll((0, app.log_horizontal_scroll as u16));
    frame.render_widget(log_paragraph, inner_area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::HorizontalBottom).thumb_symbol("■");
    let scrollbar_area = Rect {
        x: inner_area.x,
        y: inner_area.y + inner_area.height.saturating_sub(1),
        width: inner_area.width,
        height: 1,
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut app.log_horizontal_scroll_state);
}
