// src/config.rs

use crate::core::error::ConfigError;
use crate::logging::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "config.json";

/// Names or paths of the external binaries the pipeline drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub nmap: String,
    pub rustscan: String,
    pub feroxbuster: String,
    pub sublist3r: String,
    pub smbclient: String,
    pub dig: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            nmap: "nmap".to_string(),
            rustscan: "rustscan".to_string(),
            feroxbuster: "feroxbuster".to_string(),
            sublist3r: "sublist3r".to_string(),
            smbclient: "smbclient".to_string(),
            dig: "dig".to_string(),
        }
    }
}

/// Per-tool time limits, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub nmap_secs: u64,
    pub rustscan_secs: u64,
    pub feroxbuster_secs: u64,
    pub sublist3r_secs: u64,
    pub smbclient_secs: u64,
    pub dig_secs: u64,
    pub http_secs: u64,
    pub enumeration_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            nmap_secs: 900,
            rustscan_secs: 300,
            feroxbuster_secs: 600,
            sublist3r_secs: 300,
            smbclient_secs: 30,
            dig_secs: 15,
            http_secs: 10,
            enumeration_secs: 10,
        }
    }
}

impl Timeouts {
    pub fn nmap(&self) -> Duration {
        Duration::from_secs(self.nmap_secs)
    }

    pub fn rustscan(&self) -> Duration {
        Duration::from_secs(self.rustscan_secs)
    }

    pub fn feroxbuster(&self) -> Duration {
        Duration::from_secs(self.feroxbuster_secs)
    }

    pub fn sublist3r(&self) -> Duration {
        Duration::from_secs(self.sublist3r_secs)
    }

    pub fn smbclient(&self) -> Duration {
        Duration::from_secs(self.smbclient_secs)
    }

    pub fn dig(&self) -> Duration {
        Duration::from_secs(self.dig_secs)
    }

    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub fn enumeration(&self) -> Duration {
        Duration::from_secs(self.enumeration_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NmapSettings {
    /// Extra arguments appended to the service scan, e.g. `["-Pn"]`.
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RustscanSettings {
    pub ulimit: u32,
    pub greppable: bool,
}

impl Default for RustscanSettings {
    fn default() -> Self {
        Self { ulimit: 5000, greppable: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeroxSettings {
    pub threads: u32,
    pub wordlist: Option<PathBuf>,
    pub no_recursion: bool,
}

impl Default for FeroxSettings {
    fn default() -> Self {
        Self { threads: 50, wordlist: None, no_recursion: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Sublist3rSettings {
    pub threads: u32,
}

impl Default for Sublist3rSettings {
    fn default() -> Self {
        Self { threads: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    /// Port re-probed for the `<port>/tcp open` marker.
    pub port: u16,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            port: 80,
            user_agent: concat!("reconkit/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// The complete, layered configuration: defaults, then the JSON file, then CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub tools: ToolPaths,
    pub timeouts: Timeouts,
    pub nmap: NmapSettings,
    pub rustscan: RustscanSettings,
    pub feroxbuster: FeroxSettings,
    pub sublist3r: Sublist3rSettings,
    pub web: WebSettings,
    pub hosts_file: PathBuf,
    /// Suffix appended to a domain label derived from a page title.
    pub domain_tld: String,
    pub output_dir: PathBuf,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            timeouts: Timeouts::default(),
            nmap: NmapSettings::default(),
            rustscan: RustscanSettings::default(),
            feroxbuster: FeroxSettings::default(),
            sublist3r: Sublist3rSettings::default(),
            web: WebSettings::default(),
            hosts_file: PathBuf::from("/etc/hosts"),
            domain_tld: "htb".to_string(),
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl ReconConfig {
    pub fn default_path() -> PathBuf {
        get_config_dir().join(CONFIG_FILE)
    }

    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, the file in the platform config
    /// directory is used when present and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                p.to_path_buf()
            }
            None => {
                let p = Self::default_path();
                if !p.exists() {
                    debug!(path = %p.display(), "No configuration file, using defaults.");
                    return Ok(Self::default());
                }
                p
            }
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file.");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = ReconConfig::from_json(
            r#"{ "tools": { "nmap": "/opt/nmap/bin/nmap" }, "web": { "port": 8080 } }"#,
        )
        .unwrap();
        assert_eq!(config.tools.nmap, "/opt/nmap/bin/nmap");
        assert_eq!(config.tools.rustscan, "rustscan");
        assert_eq!(config.web.port, 8080);
        assert!(config.web.accept_invalid_certs);
        assert_eq!(config.hosts_file, PathBuf::from("/etc/hosts"));
        assert_eq!(config.timeouts.nmap(), Duration::from_secs(900));
        assert_eq!(config.tools.sublist3r, "sublist3r");
        assert_eq!(config.sublist3r.threads, 10);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = ReconConfig::load(Some(Path::new("/nonexistent/reconkit.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "domain_tld": "thm", "feroxbuster": {{ "threads": 10 }} }}"#).unwrap();
        let config = ReconConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.domain_tld, "thm");
        assert_eq!(config.feroxbuster.threads, 10);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ReconConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
