// src/commands.rs

//! The headless subcommands: `scan`, `check` and `config`.

use crate::cli::ScanArgs;
use crate::config::ReconConfig;
use crate::core::analysis::summarize;
use crate::core::knowledge_base::get_finding_detail;
use crate::core::models::{ProgressEvent, ReconReport, Severity, StageStatus};
use crate::core::runner::{find_in_path, SystemRunner};
use crate::core::scanner::run_recon;
use color_eyre::eyre::{eyre, Result};
use crossterm::style::Stylize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub async fn scan(args: ScanArgs, mut config: ReconConfig) -> Result<()> {
    args.apply_to(&mut config);
    let request = args.request();

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = run_recon(&request, &config, Arc::new(SystemRunner), Some(tx)).await;
    // The sender was dropped with the pipeline, so the printer drains and exits.
    let _ = printer.await;
    let report = result?;

    print_summary(&report);
    Ok(())
}

fn print_event(event: &ProgressEvent) {
    let status = match event.status {
        StageStatus::Running => "[..]".cyan(),
        StageStatus::Completed => "[ok]".green(),
        StageStatus::Failed => "[!!]".red(),
        StageStatus::Skipped => "[--]".dark_grey(),
    };
    println!("{} {:<20} {}", status, event.stage.to_string(), event.message);
}

fn print_summary(report: &ReconReport) {
    let summary = summarize(report);
    println!();
    println!("{}", format!("Recon summary for {}", report.target).bold());
    println!("  Open ports : {}", summary.open_ports);
    println!("  Title      : {}", report.title().unwrap_or("-"));
    println!("  Domain     : {}", report.domain.as_deref().unwrap_or("-"));
    println!("  Paths      : {}", report.discovered.len());
    println!("  Subdomains : {}", report.subdomains.len());
    println!(
        "  Issues     : {} critical, {} warnings (score {}/100)",
        summary.critical_issues.to_string().red(),
        summary.warning_issues.to_string().yellow(),
        summary.score
    );

    for finding in &report.analysis {
        let title = get_finding_detail(&finding.code).map(|d| d.title).unwrap_or(finding.code.as_str());
        let marker = match finding.severity {
            Severity::Critical => "CRIT".red().bold(),
            Severity::Warning => "WARN".yellow(),
            Severity::Info => "INFO".blue(),
        };
        println!("  {} {}", marker, title);
    }

    for file in &report.report_files {
        println!("  Report     : {}", file.display());
    }
}

struct ToolStatus {
    name: &'static str,
    program: String,
    critical: bool,
}

fn tool_statuses(config: &ReconConfig) -> Vec<ToolStatus> {
    let tools = &config.tools;
    vec![
        ToolStatus { name: "nmap", program: tools.nmap.clone(), critical: true },
        ToolStatus { name: "rustscan", program: tools.rustscan.clone(), critical: false },
        ToolStatus { name: "feroxbuster", program: tools.feroxbuster.clone(), critical: false },
        ToolStatus { name: "sublist3r", program: tools.sublist3r.clone(), critical: false },
        ToolStatus { name: "smbclient", program: tools.smbclient.clone(), critical: false },
        ToolStatus { name: "dig", program: tools.dig.clone(), critical: false },
    ]
}

/// Prints which tools are installed. Fails only when a critical tool is missing.
pub fn check(config: &ReconConfig) -> Result<()> {
    let mut missing_critical = Vec::new();
    println!("{}", "External tools".bold());
    for tool in tool_statuses(config) {
        let installed = find_in_path(&tool.program);
        let state = match (installed, tool.critical) {
            (true, _) => "installed".green(),
            (false, true) => "MISSING (required)".red().bold(),
            (false, false) => "missing (optional)".yellow(),
        };
        println!("  {:<12} {:<28} {}", tool.name, tool.program, state);
        if !installed && tool.critical {
            missing_critical.push(tool.name);
        }
    }
    info!(missing = ?missing_critical, "Dependency check finished.");

    if missing_critical.is_empty() {
        Ok(())
    } else {
        Err(eyre!("required tools not installed: {}", missing_critical.join(", ")))
    }
}

pub fn config(config: &ReconConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
