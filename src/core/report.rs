// src/core/report.rs

//! Report files: the incremental text report plus the JSON and HTML renderings.

use crate::core::analysis::summarize;
use crate::core::error::ReportError;
use crate::core::knowledge_base::get_finding_detail;
use crate::core::models::{ReconReport, ServiceResults, Severity};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Where the three report formats of one run are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

impl ReportPaths {
    /// An existing directory, or a path without an extension, receives timestamped
    /// files. Any other path is the text report and the others sit next to it;
    /// a `.json` or `.html` path names that format and the text report becomes `.txt`.
    pub fn resolve(output: Option<&Path>, default_dir: &Path, target: &str, now: DateTime<Local>) -> Self {
        let dir = match output {
            Some(p) if p.is_dir() || p.extension().is_none() => p.to_path_buf(),
            Some(p) => {
                let ext = p.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
                let text = match ext.as_deref() {
                    Some("json") | Some("html") => p.with_extension("txt"),
                    _ => p.to_path_buf(),
                };
                return Self {
                    text,
                    json: p.with_extension("json"),
                    html: p.with_extension("html"),
                };
            }
            None => default_dir.to_path_buf(),
        };
        let stem = format!("recon_{}_{}", sanitize_filename(target), now.format("%Y%m%d_%H%M%S"));
        Self {
            text: dir.join(format!("{stem}.txt")),
            json: dir.join(format!("{stem}.json")),
            html: dir.join(format!("{stem}.html")),
        }
    }
}

/// Replaces characters that are not allowed in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) { '_' } else { c })
        .collect()
}

async fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| ReportError::Io { path: parent.to_path_buf(), source })?;
    }
    Ok(())
}

/// The plain-text report. The first write creates or truncates the file and
/// every later write appends, so a partial report survives an interrupted run.
#[derive(Debug)]
pub struct TextReport {
    path: PathBuf,
    started: bool,
}

impl TextReport {
    pub fn new(path: PathBuf) -> Self {
        Self { path, started: false }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Writes `==== <header> ====` followed by the body.
    pub async fn write_section(&mut self, header: &str, body: &str) -> Result<(), ReportError> {
        let mut chunk = format!("==== {} ====\n{}", header, body);
        if !chunk.ends_with('\n') {
            chunk.push('\n');
        }
        chunk.push('\n');
        self.write(&chunk).await
    }

    /// A single `[*] ...` line recording a decision the run made.
    pub async fn write_note(&mut self, note: &str) -> Result<(), ReportError> {
        self.write(&format!("[*] {}\n", note)).await
    }

    async fn write(&mut self, chunk: &str) -> Result<(), ReportError> {
        let io_err = |source| ReportError::Io { path: self.path.clone(), source };
        if !self.started {
            ensure_parent(&self.path).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(!self.started)
            .append(self.started)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(chunk.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        self.started = true;
        debug!(path = %self.path.display(), bytes = chunk.len(), "Wrote to text report.");
        Ok(())
    }
}

pub async fn write_json(report: &ReconReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    ensure_parent(path).await?;
    fs::write(path, json)
        .await
        .map_err(|source| ReportError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "JSON report written.");
    Ok(())
}

pub async fn write_html(report: &ReconReport, path: &Path) -> Result<(), ReportError> {
    ensure_parent(path).await?;
    fs::write(path, render_html(report))
        .await
        .map_err(|source| ReportError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "HTML report written.");
    Ok(())
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// A self-contained HTML page for the run.
pub fn render_html(report: &ReconReport) -> String {
    let summary = summarize(report);
    let scan_date = report.started_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let optional = |value: Option<&str>| escape_html(value.unwrap_or("N/A"));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Recon Report - {target}</title>
<style>{css}</style>
</head>
<body>
<div class="container">
<div class="header"><h1>Reconnaissance Report</h1><div class="subtitle">{target}</div></div>
<div class="metadata">
<div><span class="label">Target:</span> {target}</div>
<div><span class="label">Scan date:</span> {scan_date}</div>
<div><span class="label">Domain:</span> {domain}</div>
<div><span class="label">Page title:</span> {title}</div>
<div><span class="label">Open ports:</span> {open_ports}</div>
<div><span class="label">Score:</span> {score}/100</div>
</div>
<div class="content">
<div class="warning-box"><strong>Legal notice:</strong> This report contains security assessment data. Ensure you have proper authorization before conducting any security testing.</div>
{ports}
{web}
{services}
{findings}
{stages}
</div>
<div class="footer">Generated by reconkit {version} | {scan_date}</div>
</div>
</body>
</html>
"#,
        target = escape_html(&report.target),
        css = CSS,
        scan_date = scan_date,
        domain = optional(report.domain.as_deref()),
        title = optional(report.title()),
        open_ports = summary.open_ports,
        score = summary.score,
        ports = render_ports(report),
        web = render_web(report),
        services = render_services(report),
        findings = render_findings(report),
        stages = render_stages(report),
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn render_ports(report: &ReconReport) -> String {
    if report.ports.is_empty() {
        return "<div class=\"section\"><h2>Port Scan Results</h2><div class=\"no-data\">No open ports detected</div></div>".to_string();
    }
    let rows: String = report
        .ports
        .iter()
        .map(|p| {
            format!(
                "<tr><td>{}/{}</td><td class=\"state-{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
                p.port,
                escape_html(&p.protocol),
                escape_html(&p.state),
                escape_html(&p.state.to_uppercase()),
                escape_html(if p.service.is_empty() { "unknown" } else { &p.service }),
                escape_html(if p.version.is_empty() { "N/A" } else { &p.version }),
            )
        })
        .collect();
    format!(
        "<div class=\"section\"><h2>Port Scan Results</h2>\n<table><thead><tr><th>Port</th><th>State</th><th>Service</th><th>Version</th></tr></thead><tbody>\n{}</tbody></table></div>",
        rows
    )
}

fn render_web(report: &ReconReport) -> String {
    let Some(web) = &report.web else {
        return String::new();
    };
    let mut items = vec![format!("<li><strong>URL:</strong> {}</li>", escape_html(&web.url))];
    if let Some(status) = web.status {
        items.push(format!("<li><strong>Status:</strong> {}</li>", status));
    }
    for (label, value) in [("Server", &web.server), ("X-Powered-By", &web.powered_by), ("Location", &web.location), ("Error", &web.error)] {
        if let Some(v) = value {
            items.push(format!("<li><strong>{}:</strong> {}</li>", label, escape_html(v)));
        }
    }
    let paths: String = report
        .discovered
        .iter()
        .map(|d| {
            let status = d.status.map(|s| s.to_string()).unwrap_or_default();
            format!("<tr><td>{}</td><td>{}</td></tr>\n", status, escape_html(&d.url))
        })
        .collect();
    let discovered = if paths.is_empty() {
        String::new()
    } else {
        format!("<h3>Discovered paths</h3><table><thead><tr><th>Status</th><th>URL</th></tr></thead><tbody>\n{}</tbody></table>", paths)
    };
    let subdomains = if report.subdomains.is_empty() {
        String::new()
    } else {
        let names: String = report.subdomains.iter().map(|s| format!("<li>{}</li>", escape_html(s))).collect();
        format!("<h3>Subdomains</h3><ul>{}</ul>", names)
    };
    format!("<div class=\"section\"><h2>Web</h2><ul>{}</ul>{}{}</div>", items.join(""), discovered, subdomains)
}

fn render_services(report: &ReconReport) -> String {
    if report.services.is_empty() {
        return String::new();
    }
    let blocks: String = report
        .services
        .iter()
        .map(|service| {
            let data = serde_json::to_string_pretty(service).unwrap_or_default();
            let heading = format!("{} (port {})", service.label().to_uppercase(), service.port());
            let extra = match service {
                ServiceResults::Smb(smb) => smb
                    .tool_run
                    .as_ref()
                    .map(|run| format!("<pre>{}</pre>", escape_html(&run.combined_output())))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            format!(
                "<div class=\"enum-section\"><div class=\"enum-title\">{}</div><pre>{}</pre>{}</div>\n",
                escape_html(&heading),
                escape_html(&data),
                extra
            )
        })
        .collect();
    format!("<div class=\"section\"><h2>Enumeration Results</h2>\n{}</div>", blocks)
}

fn render_findings(report: &ReconReport) -> String {
    if report.analysis.is_empty() {
        return String::new();
    }
    let items: String = report
        .analysis
        .iter()
        .map(|finding| {
            let class = match finding.severity {
                Severity::Critical => "critical",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            match get_finding_detail(&finding.code) {
                Some(detail) => format!(
                    "<div class=\"finding {}\"><h3>{}</h3><p>{}</p><p><em>{}</em></p></div>\n",
                    class,
                    escape_html(detail.title),
                    escape_html(detail.description),
                    escape_html(detail.remediation)
                ),
                None => format!("<div class=\"finding {}\"><h3>{}</h3></div>\n", class, escape_html(&finding.code)),
            }
        })
        .collect();
    format!("<div class=\"section\"><h2>Findings</h2>\n{}</div>", items)
}

fn render_stages(report: &ReconReport) -> String {
    let rows: String = report
        .stages
        .iter()
        .map(|record| {
            let command = record.tool_run.as_ref().map(|r| r.command_line.as_str()).unwrap_or("");
            format!(
                "<tr><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                record.stage,
                record.status,
                escape_html(command),
                escape_html(record.note.as_deref().unwrap_or(""))
            )
        })
        .collect();
    format!(
        "<div class=\"section\"><h2>Stages</h2>\n<table><thead><tr><th>Stage</th><th>Status</th><th>Command</th><th>Note</th></tr></thead><tbody>\n{}</tbody></table></div>",
        rows
    )
}

const CSS: &str = "
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #1e3c72; padding: 20px; color: #333; }
.container { max-width: 1200px; margin: 0 auto; background: white; border-radius: 10px; overflow: hidden; }
.header { background: #2a5298; color: white; padding: 30px; text-align: center; }
.header h1 { font-size: 2.2em; margin-bottom: 10px; }
.metadata { background: #f8f9fa; padding: 20px 30px; display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 10px; }
.label { font-weight: bold; color: #495057; }
.content { padding: 30px; }
.section { margin-bottom: 32px; }
.section h2 { color: #2a5298; border-bottom: 2px solid #e9ecef; padding-bottom: 8px; margin-bottom: 16px; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #e9ecef; }
th { background: #2a5298; color: white; }
.state-open { color: #28a745; font-weight: bold; }
pre { background: #f8f9fa; padding: 12px; overflow-x: auto; font-size: 0.9em; }
.enum-section { margin-bottom: 16px; }
.enum-title { font-weight: bold; margin-bottom: 6px; }
.finding { border-left: 4px solid #17a2b8; padding: 10px 14px; margin-bottom: 10px; background: #f8f9fa; }
.finding.critical { border-color: #dc3545; }
.finding.warning { border-color: #ffc107; }
.warning-box { background: #fff3cd; border-left: 4px solid #ffc107; padding: 15px; margin-bottom: 24px; }
.no-data { color: #6c757d; font-style: italic; }
.footer { text-align: center; padding: 20px; color: #6c757d; }
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{PortEntry, WebProbe};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn sanitizes_reserved_characters() {
        assert_eq!(sanitize_filename("10.0.0.1"), "10.0.0.1");
        assert_eq!(sanitize_filename("fe80::1/64"), "fe80__1_64");
        assert_eq!(sanitize_filename(r#"a<b>c"d\e|f?g*h"#), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn directory_output_gets_timestamped_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ReportPaths::resolve(Some(dir.path()), Path::new("reports"), "10.0.0.1", fixed_time());
        assert_eq!(paths.text, dir.path().join("recon_10.0.0.1_20240309_140507.txt"));
        assert_eq!(paths.html, dir.path().join("recon_10.0.0.1_20240309_140507.html"));

        let paths = ReportPaths::resolve(None, Path::new("reports"), "10.0.0.1", fixed_time());
        assert_eq!(paths.json, Path::new("reports/recon_10.0.0.1_20240309_140507.json"));
    }

    #[test]
    fn file_output_gets_sibling_formats() {
        let paths = ReportPaths::resolve(Some(Path::new("/tmp/out/box.txt")), Path::new("reports"), "x", fixed_time());
        assert_eq!(paths.text, Path::new("/tmp/out/box.txt"));
        assert_eq!(paths.json, Path::new("/tmp/out/box.json"));
        assert_eq!(paths.html, Path::new("/tmp/out/box.html"));
    }

    #[test]
    fn json_or_html_output_keeps_three_distinct_files() {
        for given in ["/tmp/out/box.json", "/tmp/out/box.HTML"] {
            let paths = ReportPaths::resolve(Some(Path::new(given)), Path::new("reports"), "x", fixed_time());
            assert_eq!(paths.text, Path::new("/tmp/out/box.txt"));
            assert_eq!(paths.json, Path::new("/tmp/out/box.json"));
            assert_eq!(paths.html, Path::new("/tmp/out/box.html"));
        }
    }

    #[tokio::test]
    async fn first_section_truncates_and_later_ones_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scan.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale content from a previous run\n").unwrap();

        let mut text = TextReport::new(path.clone());
        text.write_section("nmap -sC -sV 10.0.0.1", "80/tcp open http").await.unwrap();
        text.write_note("Title: Board").await.unwrap();
        text.write_section("rustscan -a 10.0.0.1", "Open 10.0.0.1:80\n").await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "==== nmap -sC -sV 10.0.0.1 ====\n80/tcp open http\n\n[*] Title: Board\n==== rustscan -a 10.0.0.1 ====\nOpen 10.0.0.1:80\n\n"
        );
    }

    #[test]
    fn html_escapes_interpolated_values() {
        let mut report = ReconReport::new("10.0.0.1", 80);
        report.web = Some(WebProbe {
            url: "http://10.0.0.1".into(),
            title: Some("<script>alert('x')</script>".into()),
            ..Default::default()
        });
        report.ports = vec![PortEntry {
            port: 80,
            protocol: "tcp".into(),
            state: "open".into(),
            service: "http".into(),
            version: "Apache <2.4>".into(),
        }];
        report.subdomains = vec!["<b>x</b>.board.htb".into()];
        let html = render_html(&report);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("<li>&lt;b&gt;x&lt;/b&gt;.board.htb</li>"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("Apache &lt;2.4&gt;"));
    }

    #[tokio::test]
    async fn json_report_round_trips_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        write_json(&ReconReport::new("10.0.0.9", 80), &path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["target"], "10.0.0.9");
        assert_eq!(value["web_port"], 80);
    }
}
