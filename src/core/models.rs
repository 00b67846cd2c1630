// src/core/models.rs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use strum::Display;

// --- Reusable Result Types ---

/// A result that can hold an optional success value or a String error.
/// `Ok(None)` means the check ran but found nothing.
pub type ScanResult<T> = Result<Option<T>, String>;

// --- Findings ---

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A finding produced by the analysis pass, keyed into the knowledge base by `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self { severity, code: code.to_string() }
    }
}

// --- Pipeline ---

/// The stages of a recon run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Stage {
    #[strum(serialize = "Service scan")]
    ServiceScan,
    #[strum(serialize = "Fast port scan")]
    FastPortScan,
    #[strum(serialize = "Web port probe")]
    WebPortProbe,
    #[strum(serialize = "Web title")]
    WebTitle,
    #[strum(serialize = "TLS certificate")]
    Certificate,
    #[strum(serialize = "Hosts file")]
    HostsFile,
    #[strum(serialize = "Content discovery")]
    ContentDiscovery,
    #[strum(serialize = "Subdomain enumeration")]
    SubdomainEnumeration,
    #[strum(serialize = "Service enumeration")]
    ServiceEnumeration,
    #[strum(serialize = "Reports")]
    Reports,
}

impl Stage {
    /// Stages whose work is done by launching an external program.
    pub fn runs_tool(self) -> bool {
        matches!(
            self,
            Stage::ServiceScan
                | Stage::FastPortScan
                | Stage::WebPortProbe
                | Stage::ContentDiscovery
                | Stage::SubdomainEnumeration
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum StageStatus {
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Captured outcome of one external tool invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolRun {
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub timed_out: bool,
}

impl ToolRun {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, the way a shell redirect with `2>&1` would record it.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.trim().is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// What happened in one stage of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub tool_run: Option<ToolRun>,
    pub note: Option<String>,
    /// Set when the stage was skipped because this program is not installed.
    pub missing_tool: Option<String>,
}

/// A progress notification streamed to the UI or the console while a run is in flight.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
}

/// Switches selecting which optional stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    pub fast_scan: bool,
    pub web_check: bool,
    pub discovery: bool,
    pub subdomains: bool,
    pub update_hosts: bool,
    pub enumerate: bool,
    pub two_phase: bool,
    pub json: bool,
    pub html: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fast_scan: true,
            web_check: true,
            discovery: true,
            subdomains: true,
            update_hosts: false,
            enumerate: false,
            two_phase: false,
            json: false,
            html: false,
        }
    }
}

/// Everything the user supplies for one run.
#[derive(Debug, Clone, Default)]
pub struct ReconRequest {
    pub target: String,
    pub output: Option<PathBuf>,
    pub domain: Option<String>,
    pub port_range: Option<String>,
    pub options: PipelineOptions,
}

// --- Port Models ---

/// One row of the host/service scanner's port table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortEntry {
    pub port: u16,
    pub protocol: String,
    pub state: String,
    pub service: String,
    pub version: String,
}

impl PortEntry {
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

// --- Web Models ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebProbe {
    pub url: String,
    pub status: Option<u16>,
    pub title: Option<String>,
    pub server: Option<String>,
    pub powered_by: Option<String>,
    pub location: Option<String>,
    pub error: Option<String>,
}

/// Details extracted from a TLS certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<chrono::Utc>,
    pub not_after: DateTime<chrono::Utc>,
    pub days_until_expiry: i64,
    pub dns_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslData {
    pub is_valid: bool,
    pub certificate_info: CertificateInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SslResults {
    pub port: u16,
    pub scan: ScanResult<SslData>,
}

impl SslResults {
    /// Certificate DNS names, empty when no certificate was read.
    pub fn dns_names(&self) -> Vec<String> {
        match &self.scan {
            Ok(Some(data)) => data.certificate_info.dns_names.clone(),
            _ => Vec::new(),
        }
    }
}

/// A path reported by the content-discovery tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredPath {
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum HostsUpdate {
    Appended,
    AlreadyPresent,
}

// --- Service Enumeration Models ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FtpResults {
    pub port: u16,
    pub banner: Option<String>,
    pub anonymous_login: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshResults {
    pub port: u16,
    pub banner: Option<String>,
    pub version: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmbResults {
    pub port: u16,
    pub shares: Vec<String>,
    pub tool_run: Option<ToolRun>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsEnumResults {
    pub port: u16,
    pub zone_transfer: Option<String>,
    pub records: BTreeMap<String, Vec<String>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    #[strum(serialize = "mysql")]
    Mysql,
    #[strum(serialize = "postgresql")]
    Postgresql,
    #[strum(serialize = "mssql")]
    Mssql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseResults {
    pub port: u16,
    pub db_type: DbKind,
    pub accessible: bool,
    pub banner: Option<String>,
    pub version: Option<String>,
    pub error: Option<String>,
}

/// The result of one service enumerator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "lowercase")]
pub enum ServiceResults {
    Ftp(FtpResults),
    Ssh(SshResults),
    Smb(SmbResults),
    Dns(DnsEnumResults),
    Database(DatabaseResults),
}

impl ServiceResults {
    pub fn port(&self) -> u16 {
        match self {
            ServiceResults::Ftp(r) => r.port,
            ServiceResults::Ssh(r) => r.port,
            ServiceResults::Smb(r) => r.port,
            ServiceResults::Dns(r) => r.port,
            ServiceResults::Database(r) => r.port,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ServiceResults::Ftp(_) => "ftp".to_string(),
            ServiceResults::Ssh(_) => "ssh".to_string(),
            ServiceResults::Smb(_) => "smb".to_string(),
            ServiceResults::Dns(_) => "dns".to_string(),
            ServiceResults::Database(r) => format!("database ({})", r.db_type),
        }
    }
}

// --- Main Report ---

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconReport {
    pub target: String,
    pub domain: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub stages: Vec<StageRecord>,
    pub ports: Vec<PortEntry>,
    pub fast_scan_ports: Vec<u16>,
    pub web_port: u16,
    pub web_port_open: Option<bool>,
    pub web: Option<WebProbe>,
    pub certificate: Option<SslResults>,
    pub hosts_update: Option<Result<HostsUpdate, String>>,
    pub discovered: Vec<DiscoveredPath>,
    pub subdomains: Vec<String>,
    pub services: Vec<ServiceResults>,
    pub report_files: Vec<PathBuf>,
    pub analysis: Vec<AnalysisFinding>,
}

impl ReconReport {
    pub fn new(target: &str, web_port: u16) -> Self {
        Self {
            target: target.to_string(),
            domain: None,
            started_at: Local::now(),
            finished_at: None,
            stages: Vec::new(),
            ports: Vec::new(),
            fast_scan_ports: Vec::new(),
            web_port,
            web_port_open: None,
            web: None,
            certificate: None,
            hosts_update: None,
            discovered: Vec::new(),
            subdomains: Vec::new(),
            services: Vec::new(),
            report_files: Vec::new(),
            analysis: Vec::new(),
        }
    }

    /// The captured page title, if any and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.web
            .as_ref()
            .and_then(|w| w.title.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &PortEntry> {
        self.ports.iter().filter(|p| p.is_open())
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}
