// src/core/scanner/nmap_scanner.rs

use crate::config::ReconConfig;
use crate::core::models::PortEntry;
use crate::core::runner::ToolInvocation;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A port row in nmap's normal output: `80/tcp   open  http    Apache httpd 2.4.41`.
static RE_PORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,5})/(tcp|udp|sctp)\s+(\S+)\s+(\S+)(?:\s+(.*?))?\s*$").unwrap()
});

/// The default service scan: default scripts plus version detection.
pub fn service_scan(config: &ReconConfig, target: &str, port_range: Option<&str>) -> ToolInvocation {
    let mut inv = ToolInvocation::new(&config.tools.nmap, config.timeouts.nmap())
        .args(["-sC", "-sV"])
        .args(config.nmap.extra_args.iter().cloned());
    if let Some(range) = port_range {
        inv = inv.args(["-p", range]);
    }
    inv.arg(target)
}

/// First phase of a two-phase scan: a SYN sweep over a range or the top 1000 ports.
pub fn quick_scan(config: &ReconConfig, target: &str, port_range: Option<&str>) -> ToolInvocation {
    let inv = ToolInvocation::new(&config.tools.nmap, config.timeouts.nmap()).args(["-sS", "-T4"]);
    let inv = match port_range {
        Some(range) => inv.args(["-p", range]),
        None => inv.args(["--top-ports", "1000"]),
    };
    inv.args(config.nmap.extra_args.iter().cloned()).arg(target)
}

/// Second phase of a two-phase scan: version detection on the ports the sweep found.
pub fn version_scan(config: &ReconConfig, target: &str, ports: &[u16]) -> ToolInvocation {
    ToolInvocation::new(&config.tools.nmap, config.timeouts.nmap())
        .args(["-sV", "-sC", "-T4", "-p"])
        .arg(format_port_list(ports))
        .args(config.nmap.extra_args.iter().cloned())
        .arg(target)
}

/// A scan restricted to a single port, used to decide whether the web stages run.
pub fn port_probe(config: &ReconConfig, target: &str, port: u16) -> ToolInvocation {
    ToolInvocation::new(&config.tools.nmap, config.timeouts.nmap())
        .arg("-p")
        .arg(port.to_string())
        .args(config.nmap.extra_args.iter().cloned())
        .arg(target)
}

/// The open-port marker test, a plain substring match on the scanner's output.
pub fn is_port_open(output: &str, port: u16) -> bool {
    output.contains(&format!("{}/tcp open", port))
}

/// Extracts the port table from nmap's normal output, sorted by port.
///
/// Script output, headers and anything else that is not a port row is ignored.
pub fn parse_ports(output: &str) -> Vec<PortEntry> {
    let mut ports: Vec<PortEntry> = output
        .lines()
        .filter_map(|line| RE_PORT_LINE.captures(line.trim_end()))
        .filter_map(|caps| {
            let port = caps[1].parse::<u16>().ok()?;
            Some(PortEntry {
                port,
                protocol: caps[2].to_string(),
                state: caps[3].to_string(),
                service: caps[4].to_string(),
                version: caps.get(5).map(|m| m.as_str().to_string()).unwrap_or_default(),
            })
        })
        .collect();
    ports.sort_by(|a, b| a.port.cmp(&b.port).then_with(|| a.protocol.cmp(&b.protocol)));
    ports.dedup_by(|a, b| a.port == b.port && a.protocol == b.protocol);
    debug!(count = ports.len(), "Parsed nmap port table.");
    ports
}

/// Collapses a sorted port list into nmap's `-p` syntax, e.g. `22,80-82`.
pub fn format_port_list(ports: &[u16]) -> String {
    let mut sorted = ports.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let (mut start, mut end) = (first, first);
    for p in iter {
        if p == end + 1 {
            end = p;
            continue;
        }
        ranges.push(render_range(start, end));
        start = p;
        end = p;
    }
    ranges.push(render_range(start, end));
    ranges.join(",")
}

fn render_range(start: u16, end: u16) -> String {
    if start == end { start.to_string() } else { format!("{}-{}", start, end) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_SCAN: &str = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2024-05-01 10:00 UTC
Nmap scan report for 10.10.11.20
Host is up (0.031s latency).
Not shown: 997 closed tcp ports (reset)
PORT     STATE    SERVICE VERSION
22/tcp   open     ssh     OpenSSH 8.9p1 Ubuntu 3ubuntu0.6 (Ubuntu Linux; protocol 2.0)
| ssh-hostkey:
|_  256 aa:bb (ED25519)
80/tcp   open     http    nginx 1.18.0 (Ubuntu)
|_http-title: Did not follow redirect to http://board.htb/
8080/tcp filtered http-proxy
Service Info: OS: Linux; CPE: cpe:/o:linux:linux_kernel
";

    #[test]
    fn parses_port_rows_and_ignores_script_output() {
        let ports = parse_ports(SERVICE_SCAN);
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].port, 22);
        assert_eq!(ports[0].service, "ssh");
        assert_eq!(ports[0].version, "OpenSSH 8.9p1 Ubuntu 3ubuntu0.6 (Ubuntu Linux; protocol 2.0)");
        assert_eq!(ports[1].version, "nginx 1.18.0 (Ubuntu)");
        assert_eq!(ports[2].state, "filtered");
        assert_eq!(ports[2].version, "");
        assert!(!ports[2].is_open());
    }

    #[test]
    fn open_marker_is_a_literal_substring_check() {
        let port_probe_output = "PORT   STATE SERVICE\n80/tcp open  http\n";
        assert!(is_port_open(port_probe_output, 80));
        assert!(is_port_open("22/tcp open  ssh", 22));
        assert!(!is_port_open(port_probe_output, 22));
        // Padded service-scan columns never contain the single-space marker.
        assert!(!is_port_open(SERVICE_SCAN, 80));
        assert!(!is_port_open(SERVICE_SCAN, 22));
        assert!(!is_port_open(SERVICE_SCAN, 8080));
        assert!(!is_port_open("80/tcp filtered http", 80));
        // Same as grep: a longer port number ending in the probed one still matches.
        assert!(is_port_open("8080/tcp open http-proxy", 80));
    }

    #[test]
    fn formats_port_ranges() {
        assert_eq!(format_port_list(&[]), "");
        assert_eq!(format_port_list(&[80, 22, 81, 82, 443]), "22,80-82,443");
        assert_eq!(format_port_list(&[3306, 3306]), "3306");
    }

    #[test]
    fn invocations_put_the_target_last() {
        let mut config = ReconConfig::default();
        config.nmap.extra_args = vec!["-Pn".into()];

        let scan = service_scan(&config, "10.0.0.1", Some("1-1000"));
        assert_eq!(scan.args, ["-sC", "-sV", "-Pn", "-p", "1-1000", "10.0.0.1"]);

        let quick = quick_scan(&config, "10.0.0.1", None);
        assert_eq!(quick.args, ["-sS", "-T4", "--top-ports", "1000", "-Pn", "10.0.0.1"]);

        let probe = port_probe(&config, "10.0.0.1", 80);
        assert_eq!(probe.command_line(), "nmap -p 80 -Pn 10.0.0.1");

        let version = version_scan(&config, "10.0.0.1", &[80, 22]);
        assert_eq!(version.args, ["-sV", "-sC", "-T4", "-p", "22,80", "-Pn", "10.0.0.1"]);
    }
}
