// src/core/scanner/rustscan_scanner.rs

use crate::config::ReconConfig;
use crate::core::runner::ToolInvocation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Greppable output: `10.10.11.20 -> [22,80]`.
static RE_GREPPABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"->\s*\[([\d,\s]*)\]").unwrap());
/// Verbose output: `Open 10.10.11.20:22`.
static RE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Open\s+\S+:(\d{1,5})\b").unwrap());

pub fn fast_scan(config: &ReconConfig, target: &str) -> ToolInvocation {
    let inv = ToolInvocation::new(&config.tools.rustscan, config.timeouts.rustscan())
        .args(["-a", target, "--ulimit"])
        .arg(config.rustscan.ulimit.to_string());
    if config.rustscan.greppable { inv.arg("-g") } else { inv }
}

/// Open ports from either output format, sorted and deduplicated.
pub fn parse_open_ports(output: &str) -> Vec<u16> {
    let mut ports = BTreeSet::new();
    for caps in RE_GREPPABLE.captures_iter(output) {
        ports.extend(caps[1].split(',').filter_map(|p| p.trim().parse::<u16>().ok()));
    }
    for caps in RE_OPEN.captures_iter(output) {
        if let Ok(port) = caps[1].parse::<u16>() {
            ports.insert(port);
        }
    }
    ports.into_iter().collect()
}
