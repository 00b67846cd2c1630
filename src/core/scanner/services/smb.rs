// src/core/scanner/services/smb.rs

use crate::config::ReconConfig;
use crate::core::models::SmbResults;
use crate::core::runner::{ToolInvocation, ToolRunner};
use tracing::{info, warn};

/// Shares every Windows host exposes; not interesting on their own.
const SYSTEM_SHARES: &[&str] = &["IPC$", "print$"];
const SHARE_TYPES: &[&str] = &["Disk", "IPC", "Printer"];

pub fn share_listing(config: &ReconConfig, target: &str) -> ToolInvocation {
    ToolInvocation::new(&config.tools.smbclient, config.timeouts.smbclient()).args(["-L", target, "-N"])
}

/// Null-session share listing through `smbclient`.
pub async fn enumerate_smb(config: &ReconConfig, runner: &dyn ToolRunner, target: &str, port: u16) -> SmbResults {
    info!(target, port, "Starting SMB enumeration.");
    let mut results = SmbResults { port, ..Default::default() };

    if !runner.is_installed(&config.tools.smbclient) {
        warn!("smbclient not installed, skipping share enumeration.");
        results.error = Some("smbclient not available".to_string());
        return results;
    }

    match runner.run(&share_listing(config, target)).await {
        Ok(run) => {
            if run.succeeded() {
                results.shares = parse_shares(&run.stdout);
            } else if run.timed_out {
                results.error = Some("smbclient timed out".to_string());
            } else {
                results.error = Some(format!("smbclient exited with {:?}", run.exit_code));
            }
            results.tool_run = Some(run);
        }
        Err(e) => results.error = Some(e.to_string()),
    }

    info!(shares = results.shares.len(), "SMB enumeration finished.");
    results
}

/// Share names from the `Sharename` table, without the system shares.
///
/// A row is `<name> <Disk|IPC|Printer> [comment]`; the table ends at the first
/// other non-separator line after a row.
pub fn parse_shares(output: &str) -> Vec<String> {
    let mut shares = Vec::new();
    let mut in_table = false;
    let mut seen_rows = false;
    for line in output.lines().map(str::trim) {
        if !in_table {
            in_table = line.starts_with("Sharename");
            continue;
        }
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let is_row = fields.len() >= 2 && SHARE_TYPES.contains(&fields[1]);
        if !is_row {
            if seen_rows {
                break;
            }
            continue;
        }
        seen_rows = true;
        if !SYSTEM_SHARES.contains(&fields[0]) {
            shares.push(fields[0].to_string());
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::testing::ScriptedRunner;

    const LISTING: &str = "\
Anonymous login successful

\tSharename       Type      Comment
\t---------       ----      -------
\tprint$          Disk      Printer Drivers
\tbackups         Disk      Nightly dumps
\tIPC$            IPC       IPC Service (Samba 4.15.13-Ubuntu)
\thr              Disk
Reconnecting with SMB1 for workgroup listing.

\tServer               Comment
\t---------            -------

\tWorkgroup            Master
\t---------            -------
\tWORKGROUP            DC01
";

    #[test]
    fn parses_shares_and_stops_at_the_server_table() {
        assert_eq!(parse_shares(LISTING), vec!["backups", "hr"]);
    }

    #[test]
    fn no_table_means_no_shares() {
        assert!(parse_shares("session setup failed: NT_STATUS_ACCESS_DENIED").is_empty());
    }

    #[tokio::test]
    async fn missing_smbclient_is_recorded() {
        let runner = ScriptedRunner::new().missing("smbclient");
        let results = enumerate_smb(&ReconConfig::default(), &runner, "10.0.0.1", 445).await;
        assert_eq!(results.error.as_deref(), Some("smbclient not available"));
        assert!(results.shares.is_empty());
    }
}
