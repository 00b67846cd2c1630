// src/core/scanner/ssl_scanner.rs

use tracing::{debug, error, info};

use crate::core::models::{CertificateInfo, ScanResult, SslData, SslResults};
use chrono::{DateTime, Utc};
use native_tls::TlsConnector;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::task::spawn_blocking;
use x509_parser::prelude::*;

/// Reads the certificate served on `target:port`.
///
/// Lab targets are reached by IP and usually present self-signed certificates,
/// so verification is disabled: the point is to read the names inside it.
pub async fn run_certificate_scan(target: &str, port: u16, timeout: Duration) -> SslResults {
    info!(target, port, "Starting TLS certificate scan.");
    let target_owned = target.to_string();

    debug!("Spawning blocking task for TLS connection.");
    let scan = spawn_blocking(move || perform_tls_scan(&target_owned, port, timeout))
        .await
        .unwrap_or_else(|e| {
            error!(panic = %e, "Blocking TLS scan task panicked!");
            Err(format!("Task panicked: {}", e))
        });

    info!(ok = scan.is_ok(), "TLS certificate scan finished.");
    SslResults { port, scan }
}

fn perform_tls_scan(target: &str, port: u16, timeout: Duration) -> ScanResult<SslData> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| {
            error!(error = %e, "Failed to create TlsConnector");
            format!("TlsConnector Error: {}", e)
        })?;

    let addr = (target, port)
        .to_socket_addrs()
        .map_err(|e| format!("Address Resolution Error: {}", e))?
        .next()
        .ok_or_else(|| format!("No address found for {}", target))?;

    debug!(%addr, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
        error!(error = %e, "TCP connection failed");
        format!("TCP Connection Error: {}", e)
    })?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| format!("Socket Error: {}", e))?;

    debug!(target, "Performing TLS handshake.");
    let stream = connector.connect(target, stream).map_err(|e| {
        error!(error = %e, "TLS handshake failed");
        format!("TLS Handshake Error: {}", e)
    })?;

    let cert = match stream.peer_certificate() {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!("TLS connection successful, but no peer certificate provided.");
            return Ok(None);
        }
        Err(e) => {
            error!(error = %e, "Failed to retrieve peer certificate from stream");
            return Err(format!("Could not get peer certificate: {}", e));
        }
    };

    let cert_der = cert.to_der().map_err(|e| {
        error!(error = %e, "Failed to convert certificate to DER format");
        format!("Could not convert certificate to DER: {}", e)
    })?;

    certificate_from_der(&cert_der).map(Some)
}

/// Parses a DER certificate into the fields the report keeps.
pub fn certificate_from_der(der: &[u8]) -> Result<SslData, String> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        format!("X.509 Parse Error: {}", e)
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed certificate.");

    let validity = x509.validity();
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);
    let now = Utc::now();
    let days_until_expiry = not_after.signed_duration_since(now).num_days();
    let is_valid = now > not_before && now < not_after;

    let mut dns_names: Vec<String> = Vec::new();
    if let Some(cn) = x509.subject().iter_common_name().next().and_then(|cn| cn.as_str().ok()) {
        dns_names.push(cn.to_lowercase());
    }
    if let Ok(Some(san)) = x509.subject_alternative_name() {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                let dns = dns.to_lowercase();
                if !dns_names.contains(&dns) {
                    dns_names.push(dns);
                }
            }
        }
    }

    Ok(SslData {
        is_valid,
        certificate_info: CertificateInfo {
            subject_name: x509.subject().to_string(),
            issuer_name: x509.issuer().to_string(),
            not_before,
            not_after,
            days_until_expiry,
            dns_names,
        },
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
