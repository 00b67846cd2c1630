// src/core/scanner/hosts_file.rs

use crate::core::error::HostsError;
use crate::core::models::HostsUpdate;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub fn hosts_line(ip: &str, domain: &str) -> String {
    format!("{} {}\n", ip, domain)
}

/// True when a non-comment line already maps `ip` to `domain`.
pub fn has_entry(contents: &str, ip: &str, domain: &str) -> bool {
    contents.lines().any(|line| {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        fields.next() == Some(ip) && fields.any(|name| name.eq_ignore_ascii_case(domain))
    })
}

fn validate(ip: &str, domain: &str) -> Result<(), HostsError> {
    let bad = |s: &str| s.is_empty() || s.contains(char::is_whitespace) || s.contains('#');
    if bad(ip) {
        return Err(HostsError::InvalidEntry(format!("address `{}`", ip)));
    }
    if bad(domain) {
        return Err(HostsError::InvalidEntry(format!("domain `{}`", domain)));
    }
    Ok(())
}

/// Appends `<ip> <domain>` to the hosts file unless the mapping is already there.
pub async fn append_hosts_entry(path: &Path, ip: &str, domain: &str) -> Result<HostsUpdate, HostsError> {
    validate(ip, domain)?;
    let io_err = |source: std::io::Error| {
        if source.kind() == ErrorKind::PermissionDenied {
            HostsError::PermissionDenied(path.to_path_buf())
        } else {
            HostsError::Io { path: path.to_path_buf(), source }
        }
    };

    let existing = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(e)),
    };

    if has_entry(&existing, ip, domain) {
        info!(path = %path.display(), ip, domain, "Hosts entry already present.");
        return Ok(HostsUpdate::AlreadyPresent);
    }

    let mut entry = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        entry.push('\n');
    }
    entry.push_str(&hosts_line(ip, domain));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "Could not open hosts file for writing.");
            io_err(e)
        })?;
    file.write_all(entry.as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    info!(path = %path.display(), ip, domain, "Appended hosts entry.");
    Ok(HostsUpdate::Appended)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_and_then_detects_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(&path, "127.0.0.1 localhost").unwrap();

        let first = append_hosts_entry(&path, "10.10.11.20", "board.htb").await.unwrap();
        assert_eq!(first, HostsUpdate::Appended);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "127.0.0.1 localhost\n10.10.11.20 board.htb\n"
        );

        let second = append_hosts_entry(&path, "10.10.11.20", "BOARD.htb").await.unwrap();
        assert_eq!(second, HostsUpdate::AlreadyPresent);
    }

    #[tokio::test]
    async fn creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        append_hosts_entry(&path, "10.0.0.1", "a.htb").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "10.0.0.1 a.htb\n");
    }

    #[tokio::test]
    async fn rejects_entries_that_would_corrupt_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        let err = append_hosts_entry(&path, "10.0.0.1", "a.htb evil.htb").await.unwrap_err();
        assert!(matches!(err, HostsError::InvalidEntry(_)));
        assert!(!path.exists());
    }

    #[test]
    fn commented_mappings_do_not_count() {
        let contents = "# 10.0.0.1 a.htb\n10.0.0.2 a.htb\n10.0.0.1 b.htb a.htb # lab\n";
        assert!(has_entry(contents, "10.0.0.1", "a.htb"));
        assert!(!has_entry("# 10.0.0.1 a.htb\n", "10.0.0.1", "a.htb"));
        assert!(!has_entry(contents, "10.0.0.3", "a.htb"));
    }
}
