// src/core/analysis.rs

//! Turns a finished report into knowledge-base findings and a summary score.

use crate::core::knowledge_base::get_finding_detail;
use crate::core::models::{
    AnalysisFinding, ReconReport, ServiceResults, Severity, StageStatus,
};
use std::collections::HashSet;

/// Headline numbers shown in the summary panel and the reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconSummary {
    pub open_ports: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    /// 100 minus 15 per critical and 5 per warning, floored at 0.
    pub score: u8,
}

fn finding(code: &str) -> AnalysisFinding {
    let severity = get_finding_detail(code).map(|d| d.severity).unwrap_or(Severity::Info);
    AnalysisFinding::new(severity, code)
}

/// Every finding the report supports, each code at most once, in pipeline order.
pub fn analyze_report(report: &ReconReport) -> Vec<AnalysisFinding> {
    let mut codes: Vec<&str> = Vec::new();

    if report.open_ports().next().is_some() {
        codes.push("OPEN_PORTS_FOUND");
    }

    if report.web_port_open == Some(true) {
        codes.push("WEB_PORT_OPEN");
    }
    if let Some(web) = &report.web {
        if web.error.is_some() {
            codes.push("WEB_REQUEST_FAILED");
        }
        if web.server.is_some() || web.powered_by.is_some() {
            codes.push("WEB_SERVER_DISCLOSED");
        }
    }
    if report.title().is_some() {
        codes.push("WEB_TITLE_FOUND");
    }
    if let Some(cert) = &report.certificate {
        match &cert.scan {
            Ok(Some(data)) if data.certificate_info.days_until_expiry < 0 => codes.push("SSL_EXPIRED"),
            Ok(Some(data)) if data.certificate_info.days_until_expiry < 30 => codes.push("SSL_EXPIRING_SOON"),
            Ok(_) => {}
            Err(_) => codes.push("SSL_HANDSHAKE_FAILED"),
        }
    }
    if matches!(report.hosts_update, Some(Err(_))) {
        codes.push("HOSTS_UPDATE_FAILED");
    }
    if !report.discovered.is_empty() {
        codes.push("CONTENT_PATHS_FOUND");
    }
    if !report.subdomains.is_empty() {
        codes.push("SUBDOMAINS_FOUND");
    }

    for service in &report.services {
        match service {
            ServiceResults::Ftp(r) if r.anonymous_login => codes.push("FTP_ANONYMOUS_LOGIN"),
            ServiceResults::Smb(r) if !r.shares.is_empty() => codes.push("SMB_SHARES_EXPOSED"),
            ServiceResults::Dns(r) if r.zone_transfer.is_some() => codes.push("DNS_ZONE_TRANSFER"),
            ServiceResults::Database(r) if r.accessible => codes.push("DB_EXPOSED"),
            _ => {}
        }
    }

    for record in &report.stages {
        if record.missing_tool.is_some() {
            codes.push("TOOL_MISSING");
        } else if record.status == StageStatus::Failed && record.stage.runs_tool() {
            match &record.tool_run {
                Some(run) if run.timed_out => codes.push("TOOL_TIMEOUT"),
                // No captured run means the program could not be started or awaited.
                _ => codes.push("TOOL_FAILED"),
            }
        }
    }

    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(*code))
        .map(finding)
        .collect()
}

pub fn summarize(report: &ReconReport) -> ReconSummary {
    let criticals = report.analysis.iter().filter(|a| a.severity == Severity::Critical).count();
    let warnings = report.analysis.iter().filter(|a| a.severity == Severity::Warning).count();
    let score = 100_i64 - (criticals as i64 * 15) - (warnings as i64 * 5);

    ReconSummary {
        open_ports: report.open_ports().count(),
        critical_issues: criticals,
        warning_issues: warnings,
        score: score.clamp(0, 100) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        FtpResults, PortEntry, Stage, StageRecord, ToolRun, WebProbe,
    };

    fn open_port(port: u16) -> PortEntry {
        PortEntry {
            port,
            protocol: "tcp".into(),
            state: "open".into(),
            service: "http".into(),
            version: String::new(),
        }
    }

    fn codes(findings: &[AnalysisFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn web_run_produces_web_findings() {
        let mut report = ReconReport::new("10.0.0.5", 80);
        report.ports = vec![open_port(80)];
        report.web_port_open = Some(true);
        report.web = Some(WebProbe {
            title: Some("Board Light".into()),
            server: Some("nginx/1.18.0".into()),
            ..Default::default()
        });
        let findings = analyze_report(&report);
        assert_eq!(
            codes(&findings),
            vec!["OPEN_PORTS_FOUND", "WEB_PORT_OPEN", "WEB_SERVER_DISCLOSED", "WEB_TITLE_FOUND"]
        );
    }

    #[test]
    fn tool_problems_are_reported_once_per_kind() {
        let mut report = ReconReport::new("10.0.0.5", 80);
        report.stages = vec![
            StageRecord {
                stage: Stage::FastPortScan,
                status: StageStatus::Skipped,
                tool_run: None,
                note: None,
                missing_tool: Some("rustscan".into()),
            },
            StageRecord {
                stage: Stage::ServiceScan,
                status: StageStatus::Failed,
                tool_run: Some(ToolRun { timed_out: true, ..Default::default() }),
                note: None,
                missing_tool: None,
            },
            StageRecord {
                stage: Stage::WebPortProbe,
                status: StageStatus::Failed,
                tool_run: Some(ToolRun { timed_out: true, ..Default::default() }),
                note: None,
                missing_tool: None,
            },
        ];
        assert_eq!(codes(&analyze_report(&report)), vec!["TOOL_MISSING", "TOOL_TIMEOUT"]);
    }

    #[test]
    fn tool_that_could_not_start_counts_as_failed() {
        let mut report = ReconReport::new("10.0.0.5", 80);
        report.stages = vec![
            StageRecord {
                stage: Stage::ContentDiscovery,
                status: StageStatus::Failed,
                tool_run: None,
                note: Some("failed to spawn feroxbuster: permission denied".into()),
                missing_tool: None,
            },
            StageRecord {
                stage: Stage::WebTitle,
                status: StageStatus::Failed,
                tool_run: None,
                note: Some("HTTP request failed".into()),
                missing_tool: None,
            },
        ];
        assert_eq!(codes(&analyze_report(&report)), vec!["TOOL_FAILED"]);
    }

    #[test]
    fn subdomains_are_reported() {
        let mut report = ReconReport::new("10.0.0.5", 80);
        report.subdomains = vec!["dev.board.htb".into()];
        assert_eq!(codes(&analyze_report(&report)), vec!["SUBDOMAINS_FOUND"]);
    }

    #[test]
    fn score_drops_per_issue_and_floors_at_zero() {
        let mut report = ReconReport::new("10.0.0.5", 80);
        report.services = vec![ServiceResults::Ftp(FtpResults { port: 21, anonymous_login: true, ..Default::default() })];
        report.analysis = analyze_report(&report);
        let summary = summarize(&report);
        assert_eq!(summary.critical_issues, 1);
        assert_eq!(summary.score, 85);

        report.analysis = vec![AnalysisFinding::new(Severity::Critical, "SSL_EXPIRED"); 8];
        assert_eq!(summarize(&report).score, 0);
    }
}
