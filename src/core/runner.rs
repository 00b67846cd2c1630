// src/core/runner.rs

//! Launching the external scanners.
//!
//! Every tool call in the pipeline goes through [`ToolRunner`], so the
//! orchestrator can be driven by a scripted runner in tests.

use crate::core::error::ToolError;
use crate::core::models::ToolRun;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// One external command, with the time it is allowed to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self { program: program.to_string(), args: Vec::new(), timeout }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command as a user would type it, used as the report section header.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun, ToolError>;

    fn is_installed(&self, program: &str) -> bool;
}

/// Runs tools as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun, ToolError> {
        let command_line = invocation.command_line();
        info!(command = %command_line, "Running external tool.");
        let started = Instant::now();

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound(invocation.program.clone())
                } else {
                    ToolError::Spawn { program: invocation.program.clone(), source }
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let run = ToolRun {
                    command_line,
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timed_out: false,
                };
                debug!(exit_code = ?run.exit_code, stdout_bytes = run.stdout.len(), "External tool finished.");
                Ok(run)
            }
            Ok(Err(source)) => Err(ToolError::Wait { program: invocation.program.clone(), source }),
            Err(_) => {
                warn!(command = %command_line, timeout_secs = invocation.timeout.as_secs(), "External tool timed out.");
                Ok(ToolRun {
                    command_line,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("timed out after {} seconds", invocation.timeout.as_secs()),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timed_out: true,
                })
            }
        }
    }

    fn is_installed(&self, program: &str) -> bool {
        find_in_path(program)
    }
}

/// True when `program` is an existing file path, or a file in one of the `PATH` directories.
pub fn find_in_path(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
pub mod testing {
    //! A runner that replays canned output instead of spawning processes.

    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: Mutex<HashMap<String, VecDeque<ToolRun>>>,
        missing: HashSet<String>,
        pub calls: Mutex<Vec<ToolInvocation>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues stdout for the next call of `program`, with exit status 0.
        pub fn respond(self, program: &str, stdout: &str) -> Self {
            self.respond_with(program, ToolRun {
                stdout: stdout.to_string(),
                exit_code: Some(0),
                ..Default::default()
            })
        }

        pub fn respond_with(self, program: &str, run: ToolRun) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(program.to_string())
                .or_default()
                .push_back(run);
            self
        }

        pub fn missing(mut self, program: &str) -> Self {
            self.missing.insert(program.to_string());
            self
        }

        pub fn calls_to(&self, program: &str) -> Vec<ToolInvocation> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.program == program)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl ToolRunner for ScriptedRunner {
        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolRun, ToolError> {
            if self.missing.contains(&invocation.program) {
                return Err(ToolError::NotFound(invocation.program.clone()));
            }
            self.calls.lock().unwrap().push(invocation.clone());
            let mut run = self
                .responses
                .lock()
                .unwrap()
                .get_mut(&invocation.program)
                .and_then(VecDeque::pop_front)
                .unwrap_or(ToolRun { exit_code: Some(0), ..Default::default() });
            run.command_line = invocation.command_line();
            Ok(run)
        }

        fn is_installed(&self, program: &str) -> bool {
            !self.missing.contains(program)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_arguments_with_spaces() {
        let inv = ToolInvocation::new("nmap", Duration::from_secs(5))
            .args(["-sC", "-sV"])
            .arg("--script-args")
            .arg("http.useragent=Mozilla 5.0")
            .arg("10.0.0.1");
        assert_eq!(
            inv.command_line(),
            "nmap -sC -sV --script-args 'http.useragent=Mozilla 5.0' 10.0.0.1"
        );
    }

    #[test]
    fn explicit_path_must_exist() {
        assert!(!find_in_path("/definitely/not/here/nmap"));
    }

    #[tokio::test]
    async fn missing_binary_is_reported_as_not_found() {
        let inv = ToolInvocation::new("reconkit-no-such-tool-xyz", Duration::from_secs(5));
        let err = SystemRunner.run(&inv).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(p) if p == "reconkit-no-such-tool-xyz"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let inv = ToolInvocation::new("sh", Duration::from_secs(5))
            .arg("-c")
            .arg("echo '80/tcp open http'; exit 3");
        let run = SystemRunner.run(&inv).await.unwrap();
        assert_eq!(run.stdout.trim(), "80/tcp open http");
        assert_eq!(run.exit_code, Some(3));
        assert!(!run.succeeded());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out_without_error() {
        let inv = ToolInvocation::new("sh", Duration::from_millis(200))
            .arg("-c")
            .arg("sleep 5");
        let run = SystemRunner.run(&inv).await.unwrap();
        assert!(run.timed_out);
        assert_eq!(run.exit_code, None);
    }
}
