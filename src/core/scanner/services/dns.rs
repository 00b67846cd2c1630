// src/core/scanner/services/dns.rs

use tracing::{debug, info, warn};

use crate::config::ReconConfig;
use crate::core::models::DnsEnumResults;
use crate::core::runner::{ToolInvocation, ToolRunner};
use crate::core::scanner::domain::is_valid_hostname;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Record types queried against the target's own name server.
const RECORD_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::AAAA,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::SOA,
];

/// `dig @target axfr [domain]`; a domain that is not a plain hostname is left out.
pub fn zone_transfer(config: &ReconConfig, target: &str, domain: Option<&str>) -> ToolInvocation {
    let inv = ToolInvocation::new(&config.tools.dig, config.timeouts.dig())
        .arg(format!("@{}", target))
        .arg("axfr");
    match domain.filter(|d| is_valid_hostname(d)) {
        Some(d) => inv.arg(d),
        None => inv,
    }
}

/// A transfer succeeded when dig printed something and did not report a failure.
pub fn zone_transfer_succeeded(output: &str) -> bool {
    let has_records = output
        .lines()
        .any(|l| !l.trim().is_empty() && !l.trim_start().starts_with(';'));
    has_records && !output.contains("Transfer failed")
}

/// Zone transfer attempt plus common record lookups, asking the target itself.
pub async fn enumerate_dns(
    config: &ReconConfig,
    runner: &dyn ToolRunner,
    target: &str,
    port: u16,
    domain: Option<&str>,
) -> DnsEnumResults {
    info!(target, port, ?domain, "Starting DNS enumeration.");
    let mut results = DnsEnumResults { port, ..Default::default() };

    if runner.is_installed(&config.tools.dig) {
        match runner.run(&zone_transfer(config, target, domain)).await {
            Ok(run) if run.succeeded() && zone_transfer_succeeded(&run.stdout) => {
                warn!(target, "DNS zone transfer succeeded.");
                results.zone_transfer = Some(run.stdout);
            }
            Ok(_) => debug!("Zone transfer refused or empty."),
            Err(e) => debug!(error = %e, "Zone transfer attempt failed."),
        }
    } else {
        debug!("dig not installed, skipping zone transfer.");
    }

    let server = match resolve_server(target).await {
        Ok(ip) => ip,
        Err(e) => {
            results.error = Some(e);
            return results;
        }
    };

    let mut opts = ResolverOpts::default();
    opts.timeout = config.timeouts.enumeration();
    opts.attempts = 1;
    let resolver = TokioAsyncResolver::tokio(
        ResolverConfig::from_parts(None, vec![], NameServerConfigGroup::from_ips_clear(&[server], port, true)),
        opts,
    );

    let query_name = domain.unwrap_or(target);
    results.records = match query_name.parse::<IpAddr>() {
        Ok(ip) => reverse_records(&resolver, ip).await,
        Err(_) => forward_records(&resolver, query_name).await,
    };

    info!(record_types = results.records.len(), "DNS enumeration finished.");
    results
}

async fn resolve_server(target: &str) -> Result<IpAddr, String> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }
    tokio::net::lookup_host((target, 53))
        .await
        .map_err(|e| format!("Could not resolve {}: {}", target, e))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| format!("No address found for {}", target))
}

async fn forward_records(resolver: &TokioAsyncResolver, name: &str) -> BTreeMap<String, Vec<String>> {
    let mut records = BTreeMap::new();
    for record_type in RECORD_TYPES {
        match resolver.lookup(name, *record_type).await {
            Ok(lookup) => {
                let values: Vec<String> = lookup.iter().map(|rdata| rdata.to_string()).collect();
                if !values.is_empty() {
                    records.insert(record_type.to_string(), values);
                }
            }
            Err(e) => debug!(%record_type, error = %e, "DNS lookup returned no data."),
        }
    }
    records
}

async fn reverse_records(resolver: &TokioAsyncResolver, ip: IpAddr) -> BTreeMap<String, Vec<String>> {
    let mut records = BTreeMap::new();
    match resolver.reverse_lookup(ip).await {
        Ok(lookup) => {
            let names: Vec<String> = lookup.iter().map(|name| name.to_string()).collect();
            if !names.is_empty() {
                records.insert("PTR".to_string(), names);
            }
        }
        Err(e) => debug!(error = %e, "Reverse lookup returned no data."),
    }
    records
}
