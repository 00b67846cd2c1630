// src/core/scanner/domain.rs

//! Picking the virtual-host name to scan and to map in the hosts file.

use crate::core::models::WebProbe;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use tracing::warn;
use url::Url;

/// A dotted hostname inside free text, ending in an alphabetic label.
static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b((?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,})\b").unwrap()
});

/// Chooses the domain label, first valid hostname wins:
/// the explicit label, a redirect `Location` host, a certificate name,
/// a hostname mentioned in the title, then `<title slug>.<tld>`.
///
/// The result is passed to dig and written to the hosts file, so a candidate
/// that is not a plain hostname is dropped and the next source is tried.
pub fn derive_domain(
    explicit: Option<&str>,
    web: Option<&WebProbe>,
    cert_names: &[String],
    tld: &str,
) -> Option<String> {
    if let Some(domain) = explicit
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| accept(d, "explicit"))
    {
        return Some(domain);
    }

    if let Some(host) = web
        .and_then(|w| w.location.as_deref())
        .and_then(location_host)
        .and_then(|h| accept(&h, "redirect"))
    {
        return Some(host);
    }

    if let Some(name) = cert_names
        .iter()
        .filter(|n| !n.starts_with("*.") && !is_ip(n) && n.contains('.'))
        .find_map(|n| accept(n, "certificate"))
    {
        return Some(name);
    }

    let title = web.and_then(|w| w.title.as_deref())?;
    if let Some(host) = RE_HOSTNAME.captures(title).and_then(|caps| accept(&caps[1], "title")) {
        return Some(host);
    }

    let slug = slugify(title);
    if slug.is_empty() {
        return None;
    }
    let tld = tld.trim_matches('.');
    let domain = if tld.is_empty() { slug } else { format!("{}.{}", slug, tld) };
    accept(&domain, "title slug")
}

fn accept(candidate: &str, source: &str) -> Option<String> {
    let domain = candidate.to_lowercase();
    if is_valid_hostname(&domain) {
        Some(domain)
    } else {
        warn!(candidate, source, "Ignoring domain candidate that is not a hostname.");
        None
    }
}

/// Dot-separated labels of ASCII letters, digits and `-`, none starting or ending with `-`.
pub fn is_valid_hostname(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn location_host(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?.trim_matches(|c| c == '[' || c == ']');
    if is_ip(host) { None } else { Some(host.to_lowercase()) }
}

fn is_ip(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes one `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(title: Option<&str>, location: Option<&str>) -> WebProbe {
        WebProbe {
            title: title.map(String::from),
            location: location.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_domain_wins() {
        let web = probe(Some("Board"), Some("http://other.htb/"));
        assert_eq!(derive_domain(Some(" Board.HTB "), Some(&web), &[], "htb").as_deref(), Some("board.htb"));
    }

    #[test]
    fn redirect_host_beats_title() {
        let web = probe(Some("301 Moved Permanently"), Some("http://board.htb/"));
        assert_eq!(derive_domain(None, Some(&web), &[], "htb").as_deref(), Some("board.htb"));
    }

    #[test]
    fn redirect_to_ip_or_relative_path_is_ignored() {
        let web = probe(Some("Login"), Some("http://10.10.11.20/login"));
        assert_eq!(derive_domain(None, Some(&web), &[], "htb").as_deref(), Some("login.htb"));
        let web = probe(Some("Login"), Some("/login.php"));
        assert_eq!(derive_domain(None, Some(&web), &[], "htb").as_deref(), Some("login.htb"));
    }

    #[test]
    fn certificate_name_skips_wildcards() {
        let names = vec!["*.corp.local".to_string(), "intranet.corp.local".to_string()];
        assert_eq!(derive_domain(None, None, &names, "htb").as_deref(), Some("intranet.corp.local"));
    }

    #[test]
    fn hostile_certificate_names_fall_through() {
        let names = vec![
            "-f/etc/host.conf".to_string(),
            "evil.htb -f x".to_string(),
            "a..b".to_string(),
            "mail.corp.local".to_string(),
        ];
        assert_eq!(derive_domain(None, None, &names, "htb").as_deref(), Some("mail.corp.local"));

        let web = probe(Some("Portal"), None);
        let names = vec!["-f/etc/host.conf".to_string()];
        assert_eq!(derive_domain(None, Some(&web), &names, "htb").as_deref(), Some("portal.htb"));
    }

    #[test]
    fn invalid_explicit_domain_is_not_used() {
        let web = probe(Some("Board"), None);
        assert_eq!(derive_domain(Some("-oN/tmp/x"), Some(&web), &[], "htb").as_deref(), Some("board.htb"));
        assert_eq!(derive_domain(Some("board.htb\n10.0.0.9 x"), None, &[], "htb"), None);
    }

    #[test]
    fn hostname_grammar() {
        assert!(is_valid_hostname("board.htb"));
        assert!(is_valid_hostname("soccer-home.htb"));
        assert!(is_valid_hostname("localhost"));
        assert!(!is_valid_hostname("-f"));
        assert!(!is_valid_hostname("a.-b.htb"));
        assert!(!is_valid_hostname("a-.htb"));
        assert!(!is_valid_hostname("board.htb."));
        assert!(!is_valid_hostname("board htb"));
        assert!(!is_valid_hostname("b/oard.htb"));
        assert!(!is_valid_hostname(""));
    }

    #[test]
    fn hostname_inside_title_is_used() {
        let web = probe(Some("Welcome to Editorial.htb tiempo"), None);
        assert_eq!(derive_domain(None, Some(&web), &[], "htb").as_deref(), Some("editorial.htb"));
    }

    #[test]
    fn title_slug_gets_the_tld() {
        let web = probe(Some("  Soccer - Home!! "), None);
        assert_eq!(derive_domain(None, Some(&web), &[], ".htb").as_deref(), Some("soccer-home.htb"));
        assert_eq!(derive_domain(None, Some(&web), &[], "").as_deref(), Some("soccer-home"));
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(derive_domain(None, None, &[], "htb"), None);
        let web = probe(Some("日本語"), None);
        assert_eq!(derive_domain(None, Some(&web), &[], "htb"), None);
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Apache2 Ubuntu Default Page: It works"), "apache2-ubuntu-default-page-it-works");
        assert_eq!(slugify("--"), "");
    }
}
