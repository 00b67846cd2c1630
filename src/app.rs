// src/app.rs

use crate::core::analysis::{summarize, ReconSummary};
use crate::core::models::{AnalysisFinding, PipelineOptions, ProgressEvent, ReconReport, ReconRequest};
use crate::core::scanner::validate_target;
use ratatui::widgets::{ListState, ScrollbarState};
use std::path::PathBuf;
use tracing::debug;

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Lines of the log file kept for the log panel.
const LOG_TAIL: usize = 200;
/// Ticks between log file reloads while the log panel is open.
const LOG_REFRESH_TICKS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Disclaimer,
    Idle,
    Scanning,
    Finished,
}

/// The form field that receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Target,
    Output,
    Domain,
}

impl InputField {
    pub fn next(self) -> Self {
        match self {
            InputField::Target => InputField::Output,
            InputField::Output => InputField::Domain,
            InputField::Domain => InputField::Target,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputField::Target => "Target",
            InputField::Output => "Output path",
            InputField::Domain => "Domain (optional)",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub focus: InputField,
    pub target: String,
    pub output: String,
    pub domain: String,
    pub error: Option<String>,
    pub progress: Vec<ProgressEvent>,
    pub report: Option<ReconReport>,
    pub summary: ReconSummary,
    pub displayed_score: u8,
    pub all_findings: Vec<AnalysisFinding>,
    pub analysis_list_state: ListState,
    pub spinner_frame: usize,
    pub show_logs: bool,
    pub log_path: PathBuf,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    ticks: u64,
}

impl App {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            focus: InputField::Target,
            target: String::new(),
            output: String::new(),
            domain: String::new(),
            error: None,
            progress: Vec::new(),
            report: None,
            summary: ReconSummary::default(),
            displayed_score: 0,
            all_findings: Vec::new(),
            analysis_list_state: ListState::default(),
            spinner_frame: 0,
            show_logs: false,
            log_path,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            ticks: 0,
        }
    }

    pub fn field(&self, field: InputField) -> &str {
        match field {
            InputField::Target => &self.target,
            InputField::Output => &self.output,
            InputField::Domain => &self.domain,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            InputField::Target => &mut self.target,
            InputField::Output => &mut self.output,
            InputField::Domain => &mut self.domain,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.error = None;
        self.focused_mut().push(c);
    }

    pub fn pop_char(&mut self) {
        self.focused_mut().pop();
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    /// Builds the run request from the form, or records why it cannot.
    pub fn request(&mut self) -> Option<ReconRequest> {
        let target = self.target.trim().to_string();
        if let Err(e) = validate_target(&target) {
            self.error = Some(e.to_string());
            return None;
        }
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Some(ReconRequest {
            target,
            output: non_empty(&self.output).map(PathBuf::from),
            domain: non_empty(&self.domain),
            port_range: None,
            options: PipelineOptions { json: true, ..Default::default() },
        })
    }

    pub fn start_scan(&mut self) {
        self.state = AppState::Scanning;
        self.progress.clear();
        self.error = None;
    }

    pub fn on_progress(&mut self, event: ProgressEvent) {
        self.progress.push(event);
    }

    pub fn finish(&mut self, result: Result<ReconReport, String>) {
        match result {
            Ok(report) => {
                self.summary = summarize(&report);
                self.all_findings = report.analysis.clone();
                self.analysis_list_state = ListState::default();
                if !self.all_findings.is_empty() {
                    self.analysis_list_state.select(Some(0));
                }
                self.displayed_score = 0;
                self.report = Some(report);
                self.state = AppState::Finished;
            }
            Err(e) => {
                self.error = Some(e);
                self.state = AppState::Idle;
            }
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.state == AppState::Scanning {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if self.state == AppState::Finished && self.displayed_score < self.summary.score {
            self.displayed_score = (self.displayed_score + 2).min(self.summary.score);
        }
        if self.show_logs && self.ticks % LOG_REFRESH_TICKS == 0 {
            self.refresh_logs();
        }
    }

    pub fn refresh_logs(&mut self) {
        match std::fs::read_to_string(&self.log_path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let start = lines.len().saturating_sub(LOG_TAIL);
                self.log_content = lines[start..].iter().map(|l| l.to_string()).collect();
            }
            Err(e) => debug!(error = %e, "Could not read log file."),
        }
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.refresh_logs();
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn select_next(&mut self) {
        if self.all_findings.is_empty() {
            return;
        }
        let next = match self.analysis_list_state.selected() {
            Some(i) if i + 1 < self.all_findings.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.analysis_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if let Some(i) = self.analysis_list_state.selected() {
            self.analysis_list_state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Back to an empty form for a new run; the output path is kept.
    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.focus = InputField::Target;
        self.target.clear();
        self.domain.clear();
        self.error = None;
        self.progress.clear();
        self.report = None;
        self.summary = ReconSummary::default();
        self.displayed_score = 0;
        self.all_findings.clear();
        self.analysis_list_state = ListState::default();
    }
}
