// src/core/scanner/mod.rs

//! The recon pipeline: one module per stage, driven in order by [`run_recon`].

pub mod content_discovery;
pub mod domain;
pub mod hosts_file;
pub mod nmap_scanner;
pub mod rustscan_scanner;
pub mod services;
pub mod ssl_scanner;
pub mod subdomains;
pub mod web_scanner;

use crate::config::ReconConfig;
use crate::core::analysis::analyze_report;
use crate::core::error::{ReconError, ToolError};
use crate::core::models::{
    HostsUpdate, PortEntry, ProgressEvent, ReconReport, ReconRequest, ServiceResults, Stage, StageRecord,
    StageStatus, ToolRun,
};
use crate::core::report::{self, ReportPaths, TextReport};
use crate::core::runner::{ToolInvocation, ToolRunner};
use chrono::Local;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// Rejects targets that could be read as an option by the wrapped tools.
pub fn validate_target(target: &str) -> Result<(), ReconError> {
    let invalid = |reason| Err(ReconError::InvalidTarget { target: target.to_string(), reason });
    if target.is_empty() {
        return invalid("target is empty");
    }
    if target.contains(char::is_whitespace) {
        return invalid("target contains whitespace");
    }
    if target.starts_with('-') {
        return invalid("target starts with '-'");
    }
    Ok(())
}

/// Runs every enabled stage against `request.target`.
///
/// Tool failures never stop the run: each stage is recorded as completed,
/// failed or skipped and its output lands in the text report either way.
/// Only an invalid target or an unwritable report ends it early.
pub async fn run_recon(
    request: &ReconRequest,
    config: &ReconConfig,
    runner: Arc<dyn ToolRunner>,
    progress: Option<UnboundedSender<ProgressEvent>>,
) -> Result<ReconReport, ReconError> {
    let target = request.target.trim();
    validate_target(target)?;

    let paths = ReportPaths::resolve(request.output.as_deref(), &config.output_dir, target, Local::now());
    info!(target, report = %paths.text.display(), "Starting recon run.");

    let mut pipeline = Pipeline {
        config,
        runner,
        progress,
        text: TextReport::new(paths.text.clone()),
        report: ReconReport::new(target, config.web.port),
    };
    pipeline.run(request, &paths).await?;
    Ok(pipeline.report)
}

struct Pipeline<'a> {
    config: &'a ReconConfig,
    runner: Arc<dyn ToolRunner>,
    progress: Option<UnboundedSender<ProgressEvent>>,
    text: TextReport,
    report: ReconReport,
}

impl Pipeline<'_> {
    async fn run(&mut self, request: &ReconRequest, paths: &ReportPaths) -> Result<(), ReconError> {
        let options = request.options;
        let target = self.report.target.clone();

        if options.two_phase {
            self.two_phase_scan(&target, request.port_range.as_deref()).await?;
        } else {
            let inv = nmap_scanner::service_scan(self.config, &target, request.port_range.as_deref());
            if let Some(run) = self.run_tool(Stage::ServiceScan, inv).await? {
                self.report.ports = nmap_scanner::parse_ports(&run.stdout);
            }
        }

        if options.fast_scan {
            let inv = rustscan_scanner::fast_scan(self.config, &target);
            if let Some(run) = self.run_tool(Stage::FastPortScan, inv).await? {
                self.report.fast_scan_ports = rustscan_scanner::parse_open_ports(&run.stdout);
                self.merge_fast_scan_ports();
            }
        } else {
            self.skip(Stage::FastPortScan, "disabled").await?;
        }

        if options.web_check {
            self.web_stages(&target).await?;
        } else {
            for stage in [Stage::WebPortProbe, Stage::WebTitle, Stage::Certificate] {
                self.skip(stage, "web check disabled").await?;
            }
        }

        let cert_names = self.report.certificate.as_ref().map(|c| c.dns_names()).unwrap_or_default();
        self.report.domain = domain::derive_domain(
            request.domain.as_deref(),
            self.report.web.as_ref(),
            &cert_names,
            &self.config.domain_tld,
        );
        if let Some(domain) = &self.report.domain {
            info!(domain = %domain, "Using domain.");
            self.text.write_note(&format!("Domain: {}", domain)).await?;
        }

        if options.update_hosts {
            self.update_hosts(&target).await?;
        } else {
            self.skip(Stage::HostsFile, "not requested").await?;
        }

        if !options.discovery {
            self.skip(Stage::ContentDiscovery, "disabled").await?;
        } else if self.report.title().is_none() {
            self.skip(Stage::ContentDiscovery, "no page title captured").await?;
        } else {
            let host = self.report.domain.clone().unwrap_or_else(|| target.clone());
            let url = web_scanner::web_url(&host, self.report.web_port);
            let inv = content_discovery::discovery_scan(self.config, &url);
            if let Some(run) = self.run_tool(Stage::ContentDiscovery, inv).await? {
                self.report.discovered = content_discovery::parse_discovered(&run.stdout);
                info!(paths = self.report.discovered.len(), "Content discovery finished.");
            }
        }

        match (options.subdomains, self.report.domain.clone()) {
            (false, _) => self.skip(Stage::SubdomainEnumeration, "disabled").await?,
            (true, None) => self.skip(Stage::SubdomainEnumeration, "no domain derived").await?,
            (true, Some(domain)) => {
                let inv = subdomains::subdomain_scan(self.config, &domain);
                if let Some(run) = self.run_tool(Stage::SubdomainEnumeration, inv).await? {
                    self.report.subdomains = subdomains::parse_subdomains(&run.stdout, &domain);
                    info!(subdomains = self.report.subdomains.len(), "Subdomain enumeration finished.");
                }
            }
        }

        if options.enumerate {
            self.enumerate(&target).await?;
        } else {
            self.skip(Stage::ServiceEnumeration, "not requested").await?;
        }

        self.report.analysis = analyze_report(&self.report);
        self.report.finished_at = Some(Local::now());
        self.write_reports(options.json, options.html, paths).await
    }

    fn emit(&self, stage: Stage, status: StageStatus, message: impl Into<String>) {
        if let Some(tx) = &self.progress {
            // The receiver is gone when the UI quit mid-run; the run still finishes.
            let _ = tx.send(ProgressEvent { stage, status, message: message.into() });
        }
    }

    fn record(
        &mut self,
        stage: Stage,
        status: StageStatus,
        tool_run: Option<ToolRun>,
        note: Option<String>,
        missing_tool: Option<String>,
    ) {
        let message = note.clone().unwrap_or_else(|| status.to_string());
        self.emit(stage, status, message);
        self.report.stages.push(StageRecord { stage, status, tool_run, note, missing_tool });
    }

    async fn skip(&mut self, stage: Stage, reason: &str) -> Result<(), ReconError> {
        info!(%stage, reason, "Stage skipped.");
        self.record(stage, StageStatus::Skipped, None, Some(reason.to_string()), None);
        Ok(())
    }

    /// Runs one tool and writes its section to the text report.
    ///
    /// Returns the captured run whenever the tool ran at all, including when it
    /// failed or timed out, so callers can still use partial output.
    async fn run_tool(&mut self, stage: Stage, invocation: ToolInvocation) -> Result<Option<ToolRun>, ReconError> {
        self.emit(stage, StageStatus::Running, invocation.command_line());
        match self.runner.run(&invocation).await {
            Ok(run) => {
                self.text.write_section(&run.command_line, &run.combined_output()).await?;
                let (status, note) = if run.timed_out {
                    (StageStatus::Failed, Some(format!("timed out after {}s", invocation.timeout.as_secs())))
                } else if run.succeeded() {
                    (StageStatus::Completed, None)
                } else {
                    let code = run.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
                    (StageStatus::Failed, Some(format!("exited with status {}", code)))
                };
                self.record(stage, status, Some(run.clone()), note, None);
                Ok(Some(run))
            }
            Err(ToolError::NotFound(program)) => {
                warn!(%stage, program = %program, "Tool not installed, stage skipped.");
                let note = format!("{} is not installed", program);
                self.text.write_note(&format!("{} skipped: {}", stage, note)).await?;
                self.record(stage, StageStatus::Skipped, None, Some(note), Some(program));
                Ok(None)
            }
            Err(e) => {
                error!(%stage, error = %e, "Tool could not be run.");
                self.text.write_note(&format!("{} failed: {}", stage, e)).await?;
                self.record(stage, StageStatus::Failed, None, Some(e.to_string()), None);
                Ok(None)
            }
        }
    }

    async fn two_phase_scan(&mut self, target: &str, port_range: Option<&str>) -> Result<(), ReconError> {
        let inv = nmap_scanner::quick_scan(self.config, target, port_range);
        let Some(run) = self.run_tool(Stage::ServiceScan, inv).await? else {
            return Ok(());
        };
        let swept = nmap_scanner::parse_ports(&run.stdout);
        let open: Vec<u16> = swept.iter().filter(|p| p.is_open()).map(|p| p.port).collect();
        self.report.ports = swept;
        if open.is_empty() {
            info!("Port sweep found no open ports, skipping version scan.");
            return Ok(());
        }

        let inv = nmap_scanner::version_scan(self.config, target, &open);
        if let Some(run) = self.run_tool(Stage::ServiceScan, inv).await? {
            let detailed = nmap_scanner::parse_ports(&run.stdout);
            if !detailed.is_empty() {
                self.report.ports = detailed;
            }
        }
        Ok(())
    }

    /// Adds ports only the fast scanner saw to the port table as open.
    fn merge_fast_scan_ports(&mut self) {
        for &port in &self.report.fast_scan_ports {
            if !self.report.ports.iter().any(|p| p.port == port && p.protocol == "tcp") {
                self.report.ports.push(PortEntry {
                    port,
                    protocol: "tcp".to_string(),
                    state: "open".to_string(),
                    service: "unknown".to_string(),
                    version: String::new(),
                });
            }
        }
        self.report.ports.sort_by_key(|p| p.port);
    }

    async fn web_stages(&mut self, target: &str) -> Result<(), ReconError> {
        let port = self.report.web_port;
        let inv = nmap_scanner::port_probe(self.config, target, port);
        let open = match self.run_tool(Stage::WebPortProbe, inv).await? {
            Some(run) => nmap_scanner::is_port_open(&run.stdout, port),
            None => false,
        };
        self.report.web_port_open = Some(open);
        self.text
            .write_note(&format!("{}/tcp open: {}", port, if open { "yes" } else { "no" }))
            .await?;

        if !open {
            self.skip(Stage::WebTitle, "web port not open").await?;
            self.skip(Stage::Certificate, "web port not open").await?;
            return Ok(());
        }

        let url = web_scanner::web_url(target, port);
        self.emit(Stage::WebTitle, StageStatus::Running, format!("GET {}", url));
        let probe = web_scanner::run_web_probe(self.config, &url).await;
        let (status, note) = match (&probe.error, probe.title.as_deref()) {
            (Some(e), _) => (StageStatus::Failed, e.clone()),
            (None, Some(title)) if !title.is_empty() => (StageStatus::Completed, format!("title: {}", title)),
            (None, _) => (StageStatus::Completed, "no title".to_string()),
        };
        self.text.write_note(&format!("Title ({}): {}", url, probe.title.as_deref().unwrap_or(""))).await?;
        self.report.web = Some(probe);
        self.record(Stage::WebTitle, status, None, Some(note), None);

        if web_scanner::scheme_for_port(port) == "https" {
            self.emit(Stage::Certificate, StageStatus::Running, format!("TLS handshake with {}:{}", target, port));
            let cert = ssl_scanner::run_certificate_scan(target, port, self.config.timeouts.http()).await;
            let (status, note) = match &cert.scan {
                Ok(Some(data)) => (StageStatus::Completed, format!("names: {}", data.certificate_info.dns_names.join(", "))),
                Ok(None) => (StageStatus::Completed, "no certificate presented".to_string()),
                Err(e) => (StageStatus::Failed, e.clone()),
            };
            self.report.certificate = Some(cert);
            self.record(Stage::Certificate, status, None, Some(note), None);
        } else {
            self.skip(Stage::Certificate, "plain HTTP port").await?;
        }
        Ok(())
    }

    async fn update_hosts(&mut self, target: &str) -> Result<(), ReconError> {
        let Some(domain) = self.report.domain.clone() else {
            return self.skip(Stage::HostsFile, "no domain derived").await;
        };
        if target.parse::<IpAddr>().is_err() {
            return self.skip(Stage::HostsFile, "target is not an IP address").await;
        }

        let path = self.config.hosts_file.clone();
        self.emit(Stage::HostsFile, StageStatus::Running, format!("{} {}", target, domain));
        let result = hosts_file::append_hosts_entry(&path, target, &domain).await;
        let (status, note) = match &result {
            Ok(HostsUpdate::Appended) => {
                (StageStatus::Completed, format!("appended '{} {}' to {}", target, domain, path.display()))
            }
            Ok(HostsUpdate::AlreadyPresent) => {
                (StageStatus::Completed, format!("'{} {}' already in {}", target, domain, path.display()))
            }
            Err(e) => {
                warn!(error = %e, "Hosts file update failed.");
                (StageStatus::Failed, e.to_string())
            }
        };
        self.text.write_note(&format!("Hosts file: {}", note)).await?;
        self.report.hosts_update = Some(result.map_err(|e| e.to_string()));
        self.record(Stage::HostsFile, status, None, Some(note), None);
        Ok(())
    }

    async fn enumerate(&mut self, target: &str) -> Result<(), ReconError> {
        self.emit(Stage::ServiceEnumeration, StageStatus::Running, "enumerating open services");
        let results = services::enumerate_services(
            self.config,
            Arc::clone(&self.runner),
            target,
            self.report.domain.as_deref(),
            &self.report.ports,
        )
        .await;

        for service in &results {
            let header = format!("{} enumeration (port {})", service.label(), service.port());
            self.text.write_section(&header, &describe_service(service)).await?;
        }
        let note = format!("{} services enumerated", results.len());
        self.report.services = results;
        self.record(Stage::ServiceEnumeration, StageStatus::Completed, None, Some(note), None);
        Ok(())
    }

    async fn write_reports(&mut self, json: bool, html: bool, paths: &ReportPaths) -> Result<(), ReconError> {
        self.emit(Stage::Reports, StageStatus::Running, "writing reports");
        if self.text.is_started() {
            self.report.report_files.push(paths.text.clone());
        }
        if json {
            self.report.report_files.push(paths.json.clone());
        }
        if html {
            self.report.report_files.push(paths.html.clone());
        }
        let note = self
            .report
            .report_files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.record(Stage::Reports, StageStatus::Completed, None, Some(note), None);

        if json {
            report::write_json(&self.report, &paths.json).await?;
        }
        if html {
            report::write_html(&self.report, &paths.html).await?;
        }
        info!(files = self.report.report_files.len(), "Recon run finished.");
        Ok(())
    }
}

/// Plain-text summary of one enumerator's result for the text report.
fn describe_service(service: &ServiceResults) -> String {
    let mut lines = Vec::new();
    match service {
        ServiceResults::Ftp(r) => {
            lines.push(format!("Banner: {}", r.banner.as_deref().unwrap_or("-")));
            lines.push(format!("Anonymous login: {}", if r.anonymous_login { "allowed" } else { "denied" }));
        }
        ServiceResults::Ssh(r) => {
            lines.push(format!("Banner: {}", r.banner.as_deref().unwrap_or("-")));
            lines.push(format!("Version: {}", r.version.as_deref().unwrap_or("-")));
        }
        ServiceResults::Smb(r) => {
            if let Some(run) = &r.tool_run {
                lines.push(format!("$ {}", run.command_line));
                lines.push(run.combined_output().trim_end().to_string());
            }
            lines.push(format!("Shares: {}", if r.shares.is_empty() { "-".to_string() } else { r.shares.join(", ") }));
        }
        ServiceResults::Dns(r) => {
            match &r.zone_transfer {
                Some(zone) => {
                    lines.push("Zone transfer: allowed".to_string());
                    lines.push(zone.trim_end().to_string());
                }
                None => lines.push("Zone transfer: refused".to_string()),
            }
            for (record_type, values) in &r.records {
                lines.push(format!("{}: {}", record_type, values.join(", ")));
            }
        }
        ServiceResults::Database(r) => {
            lines.push(format!("Accessible: {}", if r.accessible { "yes" } else { "no" }));
            if let Some(banner) = &r.banner {
                lines.push(format!("Banner: {}", banner));
            }
            if let Some(version) = &r.version {
                lines.push(format!("Version: {}", version));
            }
        }
    }
    let error = match service {
        ServiceResults::Ftp(r) => r.error.as_deref(),
        ServiceResults::Ssh(r) => r.error.as_deref(),
        ServiceResults::Smb(r) => r.error.as_deref(),
        ServiceResults::Dns(r) => r.error.as_deref(),
        ServiceResults::Database(r) => r.error.as_deref(),
    };
    if let Some(e) = error {
        lines.push(format!("Error: {}", e));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{PipelineOptions, Severity};
    use crate::core::runner::testing::ScriptedRunner;
    use std::path::Path;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SERVICE_SCAN: &str = "\
Starting Nmap 7.94 ( https://nmap.org )
Nmap scan report for 127.0.0.1
PORT   STATE SERVICE VERSION
22/tcp open  ssh     OpenSSH 8.2p1 Ubuntu 4ubuntu0.11
80/tcp open  http    Apache httpd 2.4.41
";

    /// Serves a single fixed HTML page, returning the port it listens on.
    async fn serve_page(body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = sock.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nServer: Apache/2.4.41\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = sock.write_all(response.as_bytes()).await;
            }
        });
        port
    }

    fn request(output: &Path, options: PipelineOptions) -> ReconRequest {
        ReconRequest {
            target: "127.0.0.1".to_string(),
            output: Some(output.join("scan.txt")),
            options,
            ..Default::default()
        }
    }

    fn config_for(web_port: u16, hosts_file: &Path) -> ReconConfig {
        let mut config = ReconConfig::default();
        config.web.port = web_port;
        config.hosts_file = hosts_file.to_path_buf();
        config
    }

    #[test]
    fn rejects_option_like_targets() {
        assert!(validate_target("10.10.11.5").is_ok());
        assert!(validate_target("").is_err());
        assert!(validate_target("10.0.0.1 -oN x").is_err());
        assert!(matches!(validate_target("-iL"), Err(ReconError::InvalidTarget { .. })));
    }

    #[tokio::test]
    async fn invalid_target_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let mut req = request(dir.path(), PipelineOptions::default());
        req.target = "--script=evil".to_string();
        let result = run_recon(&req, &ReconConfig::default(), runner.clone(), None).await;
        assert!(result.is_err());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_title_leads_to_discovery_and_hosts_entry() {
        let web_port = serve_page("<html><head><title>Board Light</title></head><body></body></html>").await;
        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "127.0.0.1 localhost").unwrap();

        let runner = Arc::new(
            ScriptedRunner::new()
                .respond("nmap", SERVICE_SCAN)
                .respond("nmap", &format!("PORT STATE SERVICE\n{}/tcp open  unknown\n", web_port))
                .respond("rustscan", "127.0.0.1 -> [22,80,8000]")
                .respond("feroxbuster", "http://board-light.htb/images\n")
                .respond("sublist3r", "[-] Total Unique Subdomains Found: 1\ndev.board-light.htb\n"),
        );
        let options = PipelineOptions { update_hosts: true, json: true, ..Default::default() };
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let report = run_recon(&request(dir.path(), options), &config_for(web_port, &hosts), runner.clone(), Some(tx))
            .await
            .unwrap();

        assert_eq!(report.title(), Some("Board Light"));
        assert_eq!(report.domain.as_deref(), Some("board-light.htb"));
        assert_eq!(report.ports.iter().map(|p| p.port).collect::<Vec<_>>(), vec![22, 80, 8000]);

        let ferox = runner.calls_to("feroxbuster");
        assert_eq!(ferox.len(), 1);
        assert_eq!(ferox[0].args[1], format!("http://board-light.htb:{}", web_port));
        assert_eq!(report.discovered.len(), 1);
        assert_eq!(runner.calls_to("sublist3r")[0].command_line(), "sublist3r -d board-light.htb -t 10 -n");
        assert_eq!(report.subdomains, vec!["dev.board-light.htb"]);

        assert_eq!(std::fs::read_to_string(&hosts).unwrap(), "127.0.0.1 localhost\n127.0.0.1 board-light.htb\n");
        assert!(matches!(report.hosts_update, Some(Ok(HostsUpdate::Appended))));

        let text = std::fs::read_to_string(dir.path().join("scan.txt")).unwrap();
        assert!(text.starts_with("==== nmap -sC -sV 127.0.0.1 ====\n"));
        assert!(text.contains("==== rustscan -a 127.0.0.1 --ulimit 5000 -g ===="));
        assert!(text.contains("==== feroxbuster -u http://board-light.htb:"));
        assert!(text.contains("==== sublist3r -d board-light.htb -t 10 -n ===="));
        assert!(dir.path().join("scan.json").exists());
        assert!(report.analysis.iter().any(|f| f.code == "CONTENT_PATHS_FOUND"));

        let mut stages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            stages.push(event.stage);
        }
        assert_eq!(stages.first(), Some(&Stage::ServiceScan));
        assert_eq!(stages.last(), Some(&Stage::Reports));
    }

    #[tokio::test]
    async fn closed_web_port_skips_web_stages() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond("nmap", SERVICE_SCAN)
                .respond("nmap", "PORT   STATE  SERVICE\n80/tcp closed http\n"),
        );
        let config = config_for(80, &dir.path().join("hosts"));

        let report = run_recon(&request(dir.path(), PipelineOptions::default()), &config, runner.clone(), None)
            .await
            .unwrap();

        assert_eq!(report.web_port_open, Some(false));
        assert!(report.web.is_none());
        assert!(runner.calls_to("feroxbuster").is_empty());
        assert!(runner.calls_to("sublist3r").is_empty());
        assert_eq!(report.stage(Stage::ContentDiscovery).map(|s| s.status), Some(StageStatus::Skipped));
        assert_eq!(report.stage(Stage::SubdomainEnumeration).map(|s| s.status), Some(StageStatus::Skipped));
        let text = std::fs::read_to_string(dir.path().join("scan.txt")).unwrap();
        assert!(text.contains("[*] 80/tcp open: no"));
    }

    #[tokio::test]
    async fn missing_tools_are_skipped_and_failures_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .missing("rustscan")
                .respond_with("nmap", ToolRun {
                    stdout: "Starting Nmap 7.94\n".into(),
                    stderr: "You requested a scan type which requires root privileges.\n".into(),
                    exit_code: Some(1),
                    ..Default::default()
                }),
        );
        let options = PipelineOptions { web_check: false, ..Default::default() };
        let report = run_recon(&request(dir.path(), options), &ReconConfig::default(), runner, None)
            .await
            .unwrap();

        let service = report.stage(Stage::ServiceScan).unwrap();
        assert_eq!(service.status, StageStatus::Failed);
        let fast = report.stage(Stage::FastPortScan).unwrap();
        assert_eq!(fast.status, StageStatus::Skipped);
        assert_eq!(fast.missing_tool.as_deref(), Some("rustscan"));

        let codes: Vec<&str> = report.analysis.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["TOOL_FAILED", "TOOL_MISSING"]);
        assert!(report.analysis.iter().all(|f| f.severity == Severity::Warning));

        let text = std::fs::read_to_string(dir.path().join("scan.txt")).unwrap();
        assert!(text.contains("requires root privileges"));
        assert!(text.contains("[*] Fast port scan skipped: rustscan is not installed"));
    }

    #[tokio::test]
    async fn json_output_path_keeps_text_report_separate() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().respond("nmap", SERVICE_SCAN));
        let options = PipelineOptions { fast_scan: false, web_check: false, json: true, ..Default::default() };
        let req = ReconRequest {
            target: "127.0.0.1".to_string(),
            output: Some(dir.path().join("out.json")),
            options,
            ..Default::default()
        };

        let report = run_recon(&req, &ReconConfig::default(), runner, None).await.unwrap();

        assert_eq!(report.report_files, vec![dir.path().join("out.txt"), dir.path().join("out.json")]);
        let text = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert!(text.starts_with("==== nmap -sC -sV 127.0.0.1 ===="));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
        assert_eq!(json["target"], "127.0.0.1");
    }

    #[tokio::test]
    async fn two_phase_scan_versions_only_open_ports() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond("nmap", "PORT   STATE SERVICE\n22/tcp open  ssh\n25/tcp closed smtp\n80/tcp open  http\n")
                .respond("nmap", SERVICE_SCAN),
        );
        let options = PipelineOptions { two_phase: true, fast_scan: false, web_check: false, ..Default::default() };
        let report = run_recon(&request(dir.path(), options), &ReconConfig::default(), runner.clone(), None)
            .await
            .unwrap();

        let calls = runner.calls_to("nmap");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].command_line(), "nmap -sV -sC -T4 -p 22,80 127.0.0.1");
        assert_eq!(report.ports[1].version, "Apache httpd 2.4.41");
    }
}
