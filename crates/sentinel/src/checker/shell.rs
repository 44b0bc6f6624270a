use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use super::{Checker, mismatch};
use crate::probe::{Probe, ProbeKind};
use crate::state::Outcome;

/// Bourne-compatible shell; `/bin/sh` exists on any Unix.
#[cfg(not(windows))]
pub const SHELL_PATH: &str = "/bin/sh";
#[cfg(not(windows))]
pub const SHELL_ARG: &str = "-c";

#[cfg(windows)]
pub const SHELL_PATH: &str = "cmd";
#[cfg(windows)]
pub const SHELL_ARG: &str = "/C";

/// Runs shell checks through a command interpreter.
#[derive(Debug, Clone)]
pub struct ShellChecker {
    shell: String,
    arg: String,
}

impl Default for ShellChecker {
    fn default() -> Self {
        Self::new(SHELL_PATH, SHELL_ARG)
    }
}

impl ShellChecker {
    pub fn new(shell: impl Into<String>, arg: impl Into<String>) -> Self {
        Self { shell: shell.into(), arg: arg.into() }
    }

    /// Run `command` once. On failure the error is the combined output
    /// followed by the exit status.
    ///
    /// The two streams are captured separately and joined as all of stdout
    /// then all of stderr, so lines a command interleaves across them are
    /// not kept in write order.
    pub async fn run(&self, command: &str, pattern: Option<&Regex>) -> Result<(), String> {
        let output = Command::new(&self.shell)
            .arg(&self.arg)
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {e}", self.shell))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim_end_matches(['\n', '\r']);

        if !output.status.success() {
            return Err(if combined.is_empty() {
                output.status.to_string()
            } else {
                format!("{combined}\n{}", output.status)
            });
        }

        match pattern {
            Some(regex) if !regex.is_match(combined) => Err(mismatch(regex, combined)),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Checker for ShellChecker {
    async fn check(&self, probe: &Probe) -> Outcome {
        let ProbeKind::Shell(command) = &probe.kind else {
            return Outcome::Failed(format!("{} is not a shell probe", probe.name));
        };

        match self.run(command, probe.pattern.as_ref()).await {
            Ok(()) => Outcome::Healthy,
            Err(message) => {
                debug!(probe = %probe.name, %command, "shell attempt failed");
                Outcome::Failed(message)
            }
        }
    }
}
