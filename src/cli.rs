// src/cli.rs

use crate::config::ReconConfig;
use crate::core::models::{PipelineOptions, ReconRequest};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reconkit", version)]
#[command(about = "Drives nmap, rustscan and feroxbuster against a target and collects their output.")]
pub struct Cli {
    /// Configuration file (defaults to config.json in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr as well as the log file (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive terminal UI (the default)
    #[command(alias = "t")]
    Tui,
    /// Run the pipeline against one target without the UI
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Report which external tools are installed
    #[command(alias = "c")]
    Check,
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Target IP address or host name
    pub target: String,

    /// Report file, or directory for timestamped report files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Domain to use instead of deriving one from the web page
    #[arg(long)]
    pub domain: Option<String>,

    /// Port range for the service scan, e.g. 1-65535
    #[arg(long)]
    pub port_range: Option<String>,

    /// Port probed for a web server
    #[arg(long)]
    pub web_port: Option<u16>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Debug, Args, Default)]
pub struct PipelineArgs {
    /// Do not run the fast port scanner
    #[arg(long)]
    pub skip_rustscan: bool,

    /// Do not probe the web port or fetch the page title
    #[arg(long)]
    pub skip_web_check: bool,

    /// Do not run content discovery even when a title is found
    #[arg(long)]
    pub no_discovery: bool,

    /// Do not enumerate subdomains of the derived domain
    #[arg(long)]
    pub no_subdomains: bool,

    /// Append `<ip> <domain>` to the hosts file
    #[arg(long)]
    pub update_hosts: bool,

    /// Enumerate FTP, SSH, SMB, DNS and database services on open ports
    #[arg(long)]
    pub enumerate: bool,

    /// Quick SYN sweep first, then version detection on open ports only
    #[arg(long)]
    pub two_phase: bool,

    /// Also write a JSON report
    #[arg(long)]
    pub json: bool,

    /// Also write an HTML report
    #[arg(long)]
    pub html: bool,
}

impl PipelineArgs {
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            fast_scan: !self.skip_rustscan,
            web_check: !self.skip_web_check,
            discovery: !self.no_discovery,
            subdomains: !self.no_subdomains,
            update_hosts: self.update_hosts,
            enumerate: self.enumerate,
            two_phase: self.two_phase,
            json: self.json,
            html: self.html,
        }
    }
}

impl ScanArgs {
    /// Applies the flags that override configuration values.
    pub fn apply_to(&self, config: &mut ReconConfig) {
        if let Some(port) = self.web_port {
            config.web.port = port;
        }
    }

    pub fn request(&self) -> ReconRequest {
        ReconRequest {
            target: self.target.clone(),
            output: self.output.clone(),
            domain: self.domain.clone(),
            port_range: self.port_range.clone(),
            options: self.pipeline.options(),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
