// src/ui/widgets/input.rs

use crate::app::{App, AppState, InputField};
use ratatui::{prelude::*, widgets::{Block, Borders, Paragraph}};

const FIELDS: [InputField; 3] = [InputField::Target, InputField::Output, InputField::Domain];

/// Renders the three form fields; the focused one is highlighted and holds the cursor.
pub fn render_form(frame: &mut Frame, app: &App, areas: [Rect; 3]) {
    let editable = app.state == AppState::Idle;

    for (field, area) in FIELDS.into_iter().zip(areas) {
        let focused = editable && app.focus == field;
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(field.label());

        let value = app.field(field);
        let placeholder = field == InputField::Output && value.is_empty();
        let paragraph = if placeholder {
            Paragraph::new("default report directory").style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(value).style(Style::default().fg(Color::Yellow))
        };
        frame.render_widget(paragraph.block(block), area);

        if focused {
            let x = area.x + (value.chars().count() as u16 + 1).min(area.width.saturating_sub(2));
            frame.set_cursor_position(Position::new(x, area.y + 1));
        }
    }
}
