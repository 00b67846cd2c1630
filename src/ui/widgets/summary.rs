// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use crate::core::models::{HostsUpdate, StageStatus};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

/// Renders the run overview: exposure score, recon facts and issue counts.
///
/// Only drawn once a run has finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // score
            Constraint::Length(1), // gauge
            Constraint::Length(1),
            Constraint::Length(8), // recon facts
            Constraint::Length(1),
            Constraint::Length(3), // issues
            Constraint::Min(0),    // stage table
        ])
        .split(area);

    if app.state != AppState::Finished {
        return;
    }
    let Some(report) = &app.report else {
        return;
    };

    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Low exposure", Style::default().fg(Color::Green)),
        75..=89 => ("Some leads", Style::default().fg(Color::Cyan)),
        50..=74 => ("Promising", Style::default().fg(Color::Yellow)),
        _ => ("Wide open", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Exposure Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    let score_gauge = Gauge::default()
        .percent(app.displayed_score as u16)
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    let hosts = match &report.hosts_update {
        Some(Ok(HostsUpdate::Appended)) => "entry added",
        Some(Ok(HostsUpdate::AlreadyPresent)) => "already present",
        Some(Err(_)) => "update failed",
        None => "unchanged",
    };
    let fact = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("{:<11}", label), Style::default().fg(Color::DarkGray)), Span::raw(value)])
    };
    let facts = vec![
        Line::from("RECON".bold()),
        fact("Open ports", app.summary.open_ports.to_string()),
        fact(
            "Web port",
            match report.web_port_open {
                Some(true) => format!("{} open", report.web_port),
                Some(false) => format!("{} closed", report.web_port),
                None => "not probed".to_string(),
            },
        ),
        fact("Title", report.title().unwrap_or("-").to_string()),
        fact("Domain", report.domain.clone().unwrap_or_else(|| "-".to_string())),
        fact("Paths", report.discovered.len().to_string()),
        fact("Subdomains", report.subdomains.len().to_string()),
        fact("Hosts file", hosts.to_string()),
    ];
    frame.render_widget(Paragraph::new(facts).wrap(Wrap { trim: true }), summary_chunks[3]);

    let issues = Text::from(vec![
        Line::from("ISSUES FOUND".bold()),
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(app.summary.critical_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(app.summary.warning_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(issues), summary_chunks[5]);

    let mut stage_lines = vec![Line::from("STAGES".bold())];
    for record in &report.stages {
        let (icon, style) = match record.status {
            StageStatus::Completed => ("✓", Style::default().fg(Color::Green)),
            StageStatus::Failed => ("✗", Style::default().fg(Color::Red)),
            StageStatus::Skipped => ("-", Style::default().fg(Color::DarkGray)),
            StageStatus::Running => ("…", Style::default().fg(Color::Cyan)),
        };
        stage_lines.push(Line::from(vec![
            Span::styled(format!("{} ", icon), style),
            Span::raw(record.stage.to_string()),
        ]));
    }
    frame.render_widget(Paragraph::new(stage_lines), summary_chunks[6]);
}
