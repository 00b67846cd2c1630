// src/core/scanner/services/mod.rs

//! Per-service enumeration for the open ports the service scan reported.

pub mod database;
pub mod dns;
pub mod ftp;
pub mod smb;
pub mod ssh;

use crate::config::ReconConfig;
use crate::core::models::{DbKind, PortEntry, ServiceResults};
use crate::core::runner::ToolRunner;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Which enumerator handles a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Ftp,
    Ssh,
    Smb,
    Dns,
    Database(DbKind),
}

/// Picks an enumerator by the reported service name, falling back to the port number.
pub fn classify(entry: &PortEntry) -> Option<ServiceKind> {
    let by_name = match entry.service.to_ascii_lowercase().as_str() {
        "ftp" => Some(ServiceKind::Ftp),
        "ssh" => Some(ServiceKind::Ssh),
        "microsoft-ds" | "netbios-ssn" | "smb" => Some(ServiceKind::Smb),
        "domain" | "dns" => Some(ServiceKind::Dns),
        "mysql" => Some(ServiceKind::Database(DbKind::Mysql)),
        "postgresql" | "postgres" => Some(ServiceKind::Database(DbKind::Postgresql)),
        "ms-sql-s" | "mssql" => Some(ServiceKind::Database(DbKind::Mssql)),
        _ => None,
    };
    by_name.or(match entry.port {
        21 => Some(ServiceKind::Ftp),
        22 => Some(ServiceKind::Ssh),
        139 | 445 => Some(ServiceKind::Smb),
        53 => Some(ServiceKind::Dns),
        port => database::kind_for_port(port).map(ServiceKind::Database),
    })
}

/// One port per service kind, in port order. SMB prefers 445 over 139.
pub fn plan(ports: &[PortEntry]) -> Vec<(ServiceKind, u16)> {
    let mut chosen: Vec<(ServiceKind, u16)> = Vec::new();
    for entry in ports.iter().filter(|p| p.is_open() && p.protocol == "tcp") {
        let Some(kind) = classify(entry) else { continue };
        match chosen.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) if kind == ServiceKind::Smb && entry.port == 445 => slot.1 = 445,
            Some(_) => {}
            None => chosen.push((kind, entry.port)),
        }
    }
    chosen.sort_by_key(|(_, port)| *port);
    chosen
}

pub(super) async fn connect(target: &str, port: u16, timeout: Duration) -> Result<TcpStream, String> {
    match tokio::time::timeout(timeout, TcpStream::connect((target, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(format!("Connection to {}:{} failed: {}", target, port, e)),
        Err(_) => Err(format!("Connection to {}:{} timed out", target, port)),
    }
}

/// Runs every applicable enumerator concurrently. Results come back sorted by port.
pub async fn enumerate_services(
    config: &ReconConfig,
    runner: Arc<dyn ToolRunner>,
    target: &str,
    domain: Option<&str>,
    ports: &[PortEntry],
) -> Vec<ServiceResults> {
    let planned = plan(ports);
    info!(services = planned.len(), "Enumerating services.");

    let mut set = JoinSet::new();
    for (kind, port) in planned {
        let config = config.clone();
        let runner = Arc::clone(&runner);
        let target = target.to_string();
        let domain = domain.map(str::to_string);
        let timeout = config.timeouts.enumeration();
        set.spawn(async move {
            match kind {
                ServiceKind::Ftp => ServiceResults::Ftp(ftp::enumerate_ftp(&target, port, timeout).await),
                ServiceKind::Ssh => ServiceResults::Ssh(ssh::enumerate_ssh(&target, port, timeout).await),
                ServiceKind::Smb => {
                    ServiceResults::Smb(smb::enumerate_smb(&config, runner.as_ref(), &target, port).await)
                }
                ServiceKind::Dns => ServiceResults::Dns(
                    dns::enumerate_dns(&config, runner.as_ref(), &target, port, domain.as_deref()).await,
                ),
                ServiceKind::Database(db) => {
                    ServiceResults::Database(database::enumerate_database(&target, port, db, timeout).await)
                }
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(r) => results.push(r),
            Err(e) => error!(error = %e, "Service enumeration task failed."),
        }
    }
    results.sort_by_key(ServiceResults::port);
    results
}
