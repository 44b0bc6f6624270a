//! Probe execution.
//!
//! A [`Checker`] performs exactly one attempt of a probe and judges it.
//! Retries, state and notifications belong to the scheduler.

mod http;
mod shell;

pub use http::{HttpChecker, MAX_REDIRECTS};
pub use shell::{SHELL_ARG, SHELL_PATH, ShellChecker};

use anyhow::Result;
use regex::Regex;

use crate::probe::{Probe, ProbeKind};
use crate::state::Outcome;

/// Checker trait for the different kinds of probes
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform one attempt and return its outcome with diagnostic text.
    async fn check(&self, probe: &Probe) -> Outcome;
}

/// Dispatches each probe to the strategy matching its kind.
pub struct ProbeChecker {
    http: HttpChecker,
    shell: ShellChecker,
}

impl ProbeChecker {
    pub fn new() -> Result<Self> {
        Ok(Self::with_checkers(HttpChecker::new()?, ShellChecker::default()))
    }

    pub fn with_checkers(http: HttpChecker, shell: ShellChecker) -> Self {
        Self { http, shell }
    }
}

#[async_trait::async_trait]
impl Checker for ProbeChecker {
    async fn check(&self, probe: &Probe) -> Outcome {
        match probe.kind {
            ProbeKind::Web(_) => self.http.check(probe).await,
            ProbeKind::Shell(_) => self.shell.check(probe).await,
        }
    }
}

/// Failure text for output that does not match the probe's pattern.
pub(crate) fn mismatch(pattern: &Regex, got: &str) -> String {
    format!("Expected:\n{}\n\nGot:\n{}", pattern.as_str(), got)
}
