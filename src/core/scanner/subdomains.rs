// src/core/scanner/subdomains.rs

//! Subdomain enumeration with sublist3r, run once a domain is known.

use crate::config::ReconConfig;
use crate::core::runner::ToolInvocation;
use crate::core::scanner::domain::is_valid_hostname;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static RE_ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// `sublist3r -d <domain> -t <threads> -n`.
pub fn subdomain_scan(config: &ReconConfig, domain: &str) -> ToolInvocation {
    ToolInvocation::new(&config.tools.sublist3r, config.timeouts.sublist3r())
        .args(["-d", domain, "-t"])
        .arg(config.sublist3r.threads.to_string())
        .arg("-n")
}

/// Names under `domain` printed one per line after the banner, sorted and deduplicated.
///
/// Some engines join results with `<BR>`; colour codes are stripped in case `-n`
/// is ignored by the installed version.
pub fn parse_subdomains(output: &str, domain: &str) -> Vec<String> {
    let suffix = format!(".{}", domain.to_lowercase());
    let clean = RE_ANSI.replace_all(output, "");
    clean
        .lines()
        .flat_map(|line| line.split("<BR>"))
        .map(|name| name.trim().to_lowercase())
        .filter(|name| name.ends_with(&suffix) && is_valid_hostname(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
                 ____        _     _ _     _   _____
                / ___| _   _| |__ | (_)___| |_|___ / _ __
                # Coded By Ahmed Aboul-Ela - @aboul3la

[-] Enumerating subdomains now for board.htb
[-] Searching now in Baidu..
[!] Error: Virustotal probably now is blocking our requests
[-] Total Unique Subdomains Found: 3
www.board.htb
\x1b[92mcrm.board.htb\x1b[0m
dev.board.htb<BR>www.board.htb
board.htb
evil.board.htb.attacker.net
";

    #[test]
    fn keeps_only_names_under_the_domain() {
        assert_eq!(
            parse_subdomains(OUTPUT, "Board.htb"),
            vec!["crm.board.htb", "dev.board.htb", "www.board.htb"]
        );
        assert!(parse_subdomains("[-] Total Unique Subdomains Found: 0\n", "board.htb").is_empty());
    }

    #[test]
    fn invocation_uses_configured_threads() {
        let mut config = ReconConfig::default();
        config.sublist3r.threads = 4;
        assert_eq!(subdomain_scan(&config, "board.htb").command_line(), "sublist3r -d board.htb -t 4 -n");
    }
}
