//! Static, read-only catalogue of every finding the analysis pass can emit,
//! with the explanation and the next step shown for it in the UI and reports.

use crate::core::models::Severity;
use std::fmt;

/// Groups related findings together in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Open ports and reachable network services.
    Network,
    /// The web port, its page and the paths found behind it.
    Web,
    /// Service enumeration results (FTP, SMB, DNS, databases).
    Services,
    /// Certificates served on TLS ports.
    Tls,
    /// The external tools themselves: missing, failing or timing out.
    Tooling,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Network => write!(f, "Network Exposure"),
            FindingCategory::Web => write!(f, "Web Service"),
            FindingCategory::Services => write!(f, "Service Enumeration"),
            FindingCategory::Tls => write!(f, "TLS Certificate"),
            FindingCategory::Tooling => write!(f, "Tooling"),
        }
    }
}

/// Everything needed to present one finding to the user.
pub struct FindingDetail {
    /// Machine-readable identifier, e.g. "FTP_ANONYMOUS_LOGIN".
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    pub description: &'static str,
    /// What to do next, either to exploit the lead during an assessment or to fix it.
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Network ---
    FindingDetail {
        code: "OPEN_PORTS_FOUND",
        title: "Open Ports Identified",
        category: FindingCategory::Network,
        severity: Severity::Info,
        description: "The host/service scan reported one or more open TCP ports. Each open port is a service reachable from the scanning host and part of the target's attack surface.",
        remediation: "Review the port table in the report. Close or firewall any service that does not need to be reachable from this network."
    },

    // --- Web ---
    FindingDetail {
        code: "WEB_PORT_OPEN",
        title: "Web Port Open",
        category: FindingCategory::Web,
        severity: Severity::Info,
        description: "The probe of the configured web port reported it as open, so the host serves HTTP(S) content.",
        remediation: "Browse the site manually and review the content discovery results for administrative or forgotten pages."
    },
    FindingDetail {
        code: "WEB_TITLE_FOUND",
        title: "Page Title Captured",
        category: FindingCategory::Web,
        severity: Severity::Info,
        description: "The web page returned an HTML title. The title often names the application or the virtual host the server expects, and was used to derive the domain for content discovery.",
        remediation: "Check that the derived domain resolves to the target (see the hosts file stage) so name-based virtual hosts serve the right site."
    },
    FindingDetail {
        code: "WEB_SERVER_DISCLOSED",
        title: "Server Software Disclosed",
        category: FindingCategory::Web,
        severity: Severity::Info,
        description: "The response carried a Server or X-Powered-By header naming the software behind the site. Version strings make it easy to look up known vulnerabilities.",
        remediation: "Look up the disclosed product and version for public advisories. To harden, remove or genericise these headers in the web server configuration."
    },
    FindingDetail {
        code: "WEB_REQUEST_FAILED",
        title: "Web Request Failed",
        category: FindingCategory::Web,
        severity: Severity::Warning,
        description: "The web port was reported open but fetching the page failed. The service may require a specific host name, speak a different protocol, or have reset the connection.",
        remediation: "Retry with an explicit --domain, or connect manually to see what the service actually speaks."
    },
    FindingDetail {
        code: "CONTENT_PATHS_FOUND",
        title: "Content Paths Discovered",
        category: FindingCategory::Web,
        severity: Severity::Warning,
        description: "Content discovery found paths on the web server that are not necessarily linked from the main page, such as admin panels, backups or API endpoints.",
        remediation: "Review every discovered path. Remove backups and development files from the web root and protect administrative interfaces with authentication."
    },
    FindingDetail {
        code: "SUBDOMAINS_FOUND",
        title: "Subdomains Enumerated",
        category: FindingCategory::Web,
        severity: Severity::Info,
        description: "Subdomain enumeration returned additional names under the target domain. Each one may be a separate virtual host with its own application.",
        remediation: "Add the subdomains to the hosts file next to the target address and probe each one for web content."
    },
    FindingDetail {
        code: "HOSTS_UPDATE_FAILED",
        title: "Hosts File Not Updated",
        category: FindingCategory::Web,
        severity: Severity::Warning,
        description: "Appending the derived domain to the host-resolution file failed, usually because the run lacked permission to write it. Name-based virtual hosts may not resolve.",
        remediation: "Add the line shown in the report to the hosts file manually, or re-run with elevated privileges."
    },

    // --- Services ---
    FindingDetail {
        code: "FTP_ANONYMOUS_LOGIN",
        title: "Anonymous FTP Login Allowed",
        category: FindingCategory::Services,
        severity: Severity::Critical,
        description: "The FTP server accepted the 'anonymous' user. Anyone can list and download files, and possibly upload them.",
        remediation: "List the FTP root for sensitive files. Disable anonymous access unless it is intentionally serving public data, and never allow anonymous writes."
    },
    FindingDetail {
        code: "SMB_SHARES_EXPOSED",
        title: "SMB Shares Listed Without Credentials",
        category: FindingCategory::Services,
        severity: Severity::Warning,
        description: "A null session was able to list non-default SMB shares. Share names reveal the host's purpose and some shares may also allow anonymous reads.",
        remediation: "Try connecting to each share with smbclient and no password. Restrict null sessions and require authentication on all shares."
    },
    FindingDetail {
        code: "DNS_ZONE_TRANSFER",
        title: "DNS Zone Transfer Allowed",
        category: FindingCategory::Services,
        severity: Severity::Critical,
        description: "The name server answered an AXFR request from an arbitrary client and returned the whole zone, disclosing every host name it knows about.",
        remediation: "Add the transferred host names to the hosts file and scan them. Restrict zone transfers to the secondary name servers only."
    },
    FindingDetail {
        code: "DB_EXPOSED",
        title: "Database Port Reachable",
        category: FindingCategory::Services,
        severity: Severity::Warning,
        description: "A database server accepts TCP connections from the scanning host. Databases are rarely meant to be reachable from outside the application tier.",
        remediation: "Try default credentials for the detected database. Bind the service to localhost or firewall it off from untrusted networks."
    },

    // --- TLS ---
    FindingDetail {
        code: "SSL_HANDSHAKE_FAILED",
        title: "TLS Handshake Failed",
        category: FindingCategory::Tls,
        severity: Severity::Warning,
        description: "No TLS connection could be established on the HTTPS port, so no certificate was read.",
        remediation: "Connect manually (e.g. 'openssl s_client') to see whether the port speaks TLS at all."
    },
    FindingDetail {
        code: "SSL_EXPIRED",
        title: "TLS Certificate Expired",
        category: FindingCategory::Tls,
        severity: Severity::Critical,
        description: "The certificate served on the HTTPS port has expired. Clients will warn or refuse to connect.",
        remediation: "Renew the certificate and automate renewal."
    },
    FindingDetail {
        code: "SSL_EXPIRING_SOON",
        title: "TLS Certificate Expiring Soon",
        category: FindingCategory::Tls,
        severity: Severity::Warning,
        description: "The certificate served on the HTTPS port expires in less than 30 days.",
        remediation: "Renew the certificate before it expires and verify that automated renewal works."
    },

    // --- Tooling ---
    FindingDetail {
        code: "TOOL_MISSING",
        title: "External Tool Not Installed",
        category: FindingCategory::Tooling,
        severity: Severity::Warning,
        description: "A stage was skipped because its external tool could not be found. The report is missing that stage's output.",
        remediation: "Install the tool or point the configuration at it, then run 'reconkit check' to confirm."
    },
    FindingDetail {
        code: "TOOL_FAILED",
        title: "External Tool Exited With an Error",
        category: FindingCategory::Tooling,
        severity: Severity::Warning,
        description: "An external tool exited with a non-zero status. Its output was still written to the report but may be incomplete.",
        remediation: "Read the stage's section in the text report. Raw-socket scans need root privileges."
    },
    FindingDetail {
        code: "TOOL_TIMEOUT",
        title: "External Tool Timed Out",
        category: FindingCategory::Tooling,
        severity: Severity::Warning,
        description: "An external tool ran longer than its configured timeout and was stopped.",
        remediation: "Raise the timeout for that tool in the configuration file or narrow the scan with --port-range."
    },
];

/// Looks up the full detail for a finding code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let mut seen = HashSet::new();
        for finding in FINDINGS {
            assert!(seen.insert(finding.code), "duplicate code {}", finding.code);
        }
    }

    #[test]
    fn unknown_code_has_no_detail() {
        assert!(get_finding_detail("FTP_ANONYMOUS_LOGIN").is_some());
        assert!(get_finding_detail("NOT_A_CODE").is_none());
    }
}
