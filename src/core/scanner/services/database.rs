// src/core/scanner/services/database.rs

use crate::core::models::{DatabaseResults, DbKind};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use super::connect;

pub fn kind_for_port(port: u16) -> Option<DbKind> {
    match port {
        3306 => Some(DbKind::Mysql),
        5432 => Some(DbKind::Postgresql),
        1433 => Some(DbKind::Mssql),
        _ => None,
    }
}

/// Checks whether the database port accepts connections. MySQL also sends a
/// greeting on connect, which is parsed for the server version.
pub async fn enumerate_database(target: &str, port: u16, kind: DbKind, timeout: Duration) -> DatabaseResults {
    info!(target, port, db = %kind, "Starting database enumeration.");
    let mut results = DatabaseResults {
        port,
        db_type: kind,
        accessible: false,
        banner: None,
        version: None,
        error: None,
    };

    let mut stream = match connect(target, port, timeout).await {
        Ok(s) => s,
        Err(e) => {
            results.error = Some(e);
            return results;
        }
    };
    results.accessible = true;

    if kind == DbKind::Mysql {
        let mut buf = vec![0u8; 512];
        match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => match parse_mysql_handshake(&buf[..n]) {
                MysqlGreeting::Handshake(version) => {
                    results.version = Some(parse_mysql_version(&version));
                    results.banner = Some(version);
                }
                MysqlGreeting::Refused(message) => {
                    // Host is not allowed to connect, but the server is reachable.
                    results.banner = Some(message);
                }
                MysqlGreeting::Unknown => debug!("Unrecognised MySQL greeting."),
            },
            Ok(Ok(_)) => debug!("MySQL server closed the connection without a greeting."),
            Ok(Err(e)) => results.error = Some(format!("Greeting read failed: {}", e)),
            Err(_) => results.error = Some("Greeting read timed out".to_string()),
        }
    }

    info!(accessible = results.accessible, version = ?results.version, "Database enumeration finished.");
    results
}

#[derive(Debug, PartialEq, Eq)]
pub enum MysqlGreeting {
    /// Protocol 10 handshake carrying the server version string.
    Handshake(String),
    /// Error packet sent instead of a handshake.
    Refused(String),
    Unknown,
}

pub fn parse_mysql_handshake(packet: &[u8]) -> MysqlGreeting {
    // 3-byte length + 1-byte sequence id.
    let Some(payload) = packet.get(4..) else {
        return MysqlGreeting::Unknown;
    };
    match payload.first() {
        Some(10) => {
            let rest = &payload[1..];
            match rest.iter().position(|&b| b == 0) {
                Some(end) => MysqlGreeting::Handshake(String::from_utf8_lossy(&rest[..end]).into_owned()),
                None => MysqlGreeting::Unknown,
            }
        }
        Some(0xff) => {
            let mut message = payload.get(3..).unwrap_or_default();
            if message.first() == Some(&b'#') {
                message = message.get(6..).unwrap_or_default();
            }
            MysqlGreeting::Refused(String::from_utf8_lossy(message).trim().to_string())
        }
        _ => MysqlGreeting::Unknown,
    }
}

/// `8.0.36-0ubuntu0.22.04.1` gives `8.0.36`.
pub fn parse_mysql_version(server_version: &str) -> String {
    server_version.split('-').next().unwrap_or(server_version).to_string()
}
