// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base::{self, FindingCategory};
use crate::core::models::{Severity, StageStatus};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.state {
        AppState::Disclaimer | AppState::Idle => render_idle(frame, app, area),
        AppState::Scanning => render_progress(frame, app, area),
        AppState::Finished => render_findings(frame, app, area),
    }
}

fn render_idle(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Recon");
    let mut lines = vec![
        Line::from(""),
        Line::from("Enter a target and press Enter to start."),
        Line::from("Results will appear here..."),
    ];
    if let Some(error) = &app.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center).block(block), area);
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let spinner_char = SPINNER_CHARS[app.spinner_frame];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} Scanning {}", spinner_char, app.target.trim()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let skip = app.progress.len().saturating_sub(visible);
    let lines: Vec<Line> = app.progress[skip..]
        .iter()
        .map(|event| {
            let (tag, style) = match event.status {
                StageStatus::Running => (spinner_char.to_string(), Style::default().fg(Color::Cyan)),
                StageStatus::Completed => ("✓".to_string(), Style::default().fg(Color::Green)),
                StageStatus::Failed => ("✗".to_string(), Style::default().fg(Color::Red)),
                StageStatus::Skipped => ("-".to_string(), Style::default().fg(Color::DarkGray)),
            };
            Line::from(vec![
                Span::styled(format!("{} ", tag), style),
                Span::styled(format!("{:<20}", event.stage.to_string()), Style::default().bold()),
                Span::raw(event.message.clone()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_findings(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Findings (Navigate with ↑ ↓)");
    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .all_findings
        .iter()
        .map(|f| {
            let Some(detail) = knowledge_base::get_finding_detail(&f.code) else {
                return ListItem::new(Line::from(f.code.clone()));
            };
            let category_prefix = match detail.category {
                FindingCategory::Network => "[NET] ",
                FindingCategory::Web => "[WEB] ",
                FindingCategory::Services => "[SVC] ",
                FindingCategory::Tls => "[TLS] ",
                FindingCategory::Tooling => "[TOOL] ",
            };
            let title_style = match detail.severity {
                Severity::Critical => Style::default().fg(Color::Red),
                Severity::Warning => Style::default().fg(Color::Yellow),
                Severity::Info => Style::default().fg(Color::Cyan),
            };
            ListItem::new(Line::from(vec![
                Span::styled(category_prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(detail.title, title_style),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app
        .analysis_list_state
        .selected()
        .and_then(|i| app.all_findings.get(i))
        .and_then(|f| knowledge_base::get_finding_detail(&f.code));

    match selected {
        Some(detail) => {
            let text = vec![
                Line::from(""),
                Line::from("WHAT IT IS:".yellow().bold()),
                Line::from(detail.description),
                Line::from(""),
                Line::from("NEXT STEP:".yellow().bold()),
                Line::from(detail.remediation),
            ];
            frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block), chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let placeholder_text = if app.all_findings.is_empty() {
        Text::from(vec![
            Line::from(""),
            Line::from("NOTHING TO REPORT".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("No open ports or leads were found. Check the text report for raw tool output."),
        ])
    } else {
        Text::from("Select an item above to see details.")
    };
    frame.render_widget(Paragraph::new(placeholder_text).alignment(Alignment::Center).block(block), area);
}
