// src/core/scanner/content_discovery.rs

use crate::config::ReconConfig;
use crate::core::models::DiscoveredPath;
use crate::core::runner::ToolInvocation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Normal output row: `200      GET       12l       30w      345c http://board.htb/index.php`.
static RE_RESULT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})\s+[A-Z]+\s+.*?(https?://\S+)").unwrap());

pub fn discovery_scan(config: &ReconConfig, url: &str) -> ToolInvocation {
    let settings = &config.feroxbuster;
    let mut inv = ToolInvocation::new(&config.tools.feroxbuster, config.timeouts.feroxbuster())
        .args(["-u", url, "-t"])
        .arg(settings.threads.to_string())
        .arg("--silent");
    if let Some(wordlist) = &settings.wordlist {
        inv = inv.arg("-w").arg(wordlist.to_string_lossy());
    }
    if settings.no_recursion {
        inv = inv.arg("--no-recursion");
    }
    inv
}

/// Paths found by the tool, from silent (bare URL) or normal output, first occurrence kept.
pub fn parse_discovered(output: &str) -> Vec<DiscoveredPath> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for line in output.lines().map(str::trim) {
        let entry = if let Some(caps) = RE_RESULT_LINE.captures(line) {
            DiscoveredPath { url: caps[2].to_string(), status: caps[1].parse().ok() }
        } else if (line.starts_with("http://") || line.starts_with("https://")) && !line.contains(char::is_whitespace) {
            DiscoveredPath { url: line.to_string(), status: None }
        } else {
            continue;
        };
        if seen.insert(entry.url.clone()) {
            found.push(entry);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_both_output_formats() {
        let out = "\
http://board.htb/
http://board.htb/images
200      GET       12l       30w      345c http://board.htb/index.php
301      GET        7l       12w      178c http://board.htb/images => http://board.htb/images/
WLD      GET         -         -         - Wildcard response is static; auto-filtering
";
        let found = parse_discovered(out);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], DiscoveredPath { url: "http://board.htb/".into(), status: None });
        assert_eq!(found[1].url, "http://board.htb/images");
        assert_eq!(found[2], DiscoveredPath { url: "http://board.htb/index.php".into(), status: Some(200) });
    }

    #[test]
    fn invocation_includes_wordlist_and_recursion_flags() {
        let mut config = ReconConfig::default();
        config.feroxbuster.threads = 20;
        config.feroxbuster.wordlist = Some(PathBuf::from("/usr/share/wordlists/common.txt"));
        config.feroxbuster.no_recursion = true;
        let inv = discovery_scan(&config, "http://board.htb");
        assert_eq!(
            inv.command_line(),
            "feroxbuster -u http://board.htb -t 20 --silent -w /usr/share/wordlists/common.txt --no-recursion"
        );
    }
}
