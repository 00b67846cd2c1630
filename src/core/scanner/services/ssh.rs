// src/core/scanner/services/ssh.rs

use crate::core::models::SshResults;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::connect;

pub async fn enumerate_ssh(target: &str, port: u16, timeout: Duration) -> SshResults {
    info!(target, port, "Starting SSH enumeration.");
    let mut results = SshResults { port, ..Default::default() };

    let stream = match connect(target, port, timeout).await {
        Ok(s) => s,
        Err(e) => {
            results.error = Some(e);
            return results;
        }
    };

    let mut line = String::new();
    let mut reader = BufReader::new(stream);
    match tokio::time::timeout(timeout, reader.read_line(&mut line)).await {
        Ok(Ok(_)) => {
            let banner = line.trim().to_string();
            if banner.is_empty() {
                results.error = Some("Server sent an empty banner".to_string());
            } else {
                results.version = Some(parse_version(&banner));
                results.banner = Some(banner);
            }
        }
        Ok(Err(e)) => results.error = Some(format!("Banner grab failed: {}", e)),
        Err(_) => results.error = Some("Banner grab timed out".to_string()),
    }

    info!(version = ?results.version, "SSH enumeration finished.");
    results
}

/// The software part of an identification string: `SSH-2.0-OpenSSH_8.2p1 Ubuntu` gives
/// `OpenSSH_8.2p1 Ubuntu`. Anything that is not an identification string is returned as-is.
pub fn parse_version(banner: &str) -> String {
    if banner.starts_with("SSH-") {
        let parts: Vec<&str> = banner.splitn(3, '-').collect();
        if parts.len() == 3 {
            return parts[2].to_string();
        }
    }
    banner.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_software_version() {
        assert_eq!(parse_version("SSH-2.0-OpenSSH_8.2p1 Ubuntu-4ubuntu0.5"), "OpenSSH_8.2p1 Ubuntu-4ubuntu0.5");
        assert_eq!(parse_version("SSH-1.99-Cisco-1.25"), "Cisco-1.25");
        assert_eq!(parse_version("SSH-2.0"), "SSH-2.0");
        assert_eq!(parse_version("220 not ssh"), "220 not ssh");
    }

    #[tokio::test]
    async fn reads_banner_from_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
        });

        let results = enumerate_ssh("127.0.0.1", port, Duration::from_secs(2)).await;
        assert_eq!(results.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
        assert_eq!(results.version.as_deref(), Some("OpenSSH_9.6"));
        assert!(results.error.is_none());
    }
}
