use std::time::Duration;

use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::redirect::Policy;
use tracing::debug;

use super::{Checker, mismatch};
use crate::APP_NAME;
use crate::probe::{Probe, ProbeKind, WebTarget};
use crate::state::Outcome;

/// Redirect hops followed before a fetch is considered broken.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    /// Client without a request timeout; a hanging target blocks only its
    /// own probe.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self { client: builder.build()? })
    }

    /// Fetch `target` once. The body is only read when the status code
    /// matched and a pattern is set.
    pub async fn fetch(&self, target: &WebTarget, pattern: Option<&Regex>) -> Result<()> {
        let mut request = self
            .client
            .request(target.method.clone(), target.url.clone())
            .headers(target.headers.clone());
        if let Some(body) = &target.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.context("HTTP request failed")?;
        let status = response.status().as_u16();
        if status != target.expected_status {
            bail!("{} returned {}", target.url, status);
        }

        if let Some(regex) = pattern {
            let body = response.text().await.context("HTTP body read failed")?;
            if !regex.is_match(&body) {
                bail!(mismatch(regex, &body));
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, probe: &Probe) -> Outcome {
        let ProbeKind::Web(target) = &probe.kind else {
            return Outcome::Failed(format!("{} is not a web probe", probe.name));
        };

        match self.fetch(target, probe.pattern.as_ref()).await {
            Ok(()) => Outcome::Healthy,
            Err(e) => {
                debug!(probe = %probe.name, url = %target.url, error = %e, "web attempt failed");
                Outcome::Failed(format!("{e:#}"))
            }
        }
    }
}
