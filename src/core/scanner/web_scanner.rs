// src/core/scanner/web_scanner.rs

use crate::config::ReconConfig;
use crate::core::models::WebProbe;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use scraper::{Html, Selector};
use tracing::{debug, error, info, warn};

/// Raw-body fallback for pages scraper cannot make sense of.
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn scheme_for_port(port: u16) -> &'static str {
    match port {
        443 | 8443 => "https",
        _ => "http",
    }
}

/// Base URL for a host and port, leaving out the port when it is the scheme default.
pub fn web_url(host: &str, port: u16) -> String {
    let scheme = scheme_for_port(port);
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    match (scheme, port) {
        ("http", 80) | ("https", 443) => format!("{}://{}", scheme, host),
        _ => format!("{}://{}:{}", scheme, host, port),
    }
}

/// Redirects are not followed: a `Location` pointing at a virtual host is
/// exactly what the domain derivation wants to see.
pub fn build_client(config: &ReconConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.web.user_agent.clone())
        .timeout(config.timeouts.http())
        .danger_accept_invalid_certs(config.web.accept_invalid_certs)
        .redirect(Policy::none())
        .build()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).map(|v| match v.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!(header_name = name, "Header contained invalid UTF-8.");
            "[Invalid UTF-8]".to_string()
        }
    })
}

/// Fetches `url` and records its status, title and identifying headers.
pub async fn run_web_probe(config: &ReconConfig, url: &str) -> WebProbe {
    info!(url, "Starting web probe.");
    let mut probe = WebProbe { url: url.to_string(), ..Default::default() };

    let client = match build_client(config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client for web probe.");
            probe.error = Some(format!("Failed to build HTTP client: {}", e));
            return probe;
        }
    };

    let response = match client.get(url).send().await {
        Ok(res) => res,
        Err(e) => {
            error!(url, error = %e, "HTTP request failed.");
            probe.error = Some(format!("HTTP request failed: {}", e));
            return probe;
        }
    };

    probe.status = Some(response.status().as_u16());
    let headers = response.headers();
    probe.server = header_value(headers, "server");
    probe.powered_by = header_value(headers, "x-powered-by");
    probe.location = header_value(headers, "location");

    match response.text().await {
        Ok(body) => {
            debug!(bytes = body.len(), "Read response body.");
            probe.title = extract_title(&body);
        }
        Err(e) => {
            error!(error = %e, "Failed to read response body.");
            probe.error = Some(format!("Failed to read response body: {}", e));
        }
    }

    info!(status = ?probe.status, title = ?probe.title, "Web probe finished.");
    probe
}

/// The first `<title>` of a page with whitespace collapsed, or `None` when absent or blank.
pub fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let from_dom = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
    });

    let raw = match from_dom {
        Some(t) if !t.trim().is_empty() => t,
        _ => RE_TITLE.captures(body).map(|c| c[1].to_string())?,
    };

    let title = RE_WHITESPACE.replace_all(raw.trim(), " ").into_owned();
    if title.is_empty() { None } else { Some(title) }
}
