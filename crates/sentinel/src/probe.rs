//! Probe definitions as loaded from the config file.
//!
//! A [`ProbeSpec`] mirrors one YAML entry and is never mutated after load.
//! [`ProbeSpec::compile`] validates it into a [`Probe`], the form the
//! scheduler actually runs.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Expected HTTP status code when `return` is unset.
pub const DEFAULT_STATUS_CODE: u16 = 200;
/// Attempts per poll cycle when `tries` is unset.
pub const DEFAULT_TRIES: u32 = 1;
/// Poll interval when `repeat` is unset.
pub const DEFAULT_REPEAT_SECONDS: u64 = 30;

/// Mail recipient(s) of a probe. The config accepts a string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    Single(String),
    Multiple(Vec<String>),
}

impl Recipient {
    pub fn addresses(&self) -> Vec<&str> {
        match self {
            Recipient::Single(address) => vec![address.as_str()],
            Recipient::Multiple(addresses) => addresses.iter().map(String::as_str).collect(),
        }
    }

    /// Value for the `To:` header.
    pub fn to_header(&self) -> String {
        self.addresses()
            .into_iter()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.to_header().is_empty()
    }
}

/// One configured check, exactly as written in the config file.
///
/// Zero values of `return`, `tries` and `repeat` mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSpec {
    /// Display name; falls back to the target.
    pub name: Option<String>,
    /// URL of a web check.
    pub web: Option<String>,
    /// Command line of a shell check.
    pub shell: Option<String>,
    /// Regular expression the body or command output must match.
    #[serde(rename = "match")]
    pub pattern: Option<String>,
    /// Expected HTTP status code.
    #[serde(rename = "return", default)]
    pub expected_status: u16,
    pub notify: Option<Recipient>,
    /// Executable called on every transition.
    pub alert: Option<String>,
    /// Attempts per poll cycle.
    #[serde(default)]
    pub tries: u32,
    /// Seconds between poll cycles.
    #[serde(default)]
    pub repeat: u64,
    /// Seconds between attempts of one cycle.
    #[serde(default)]
    pub sleep: u64,
    pub method: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// The two execution strategies a probe can have.
#[derive(Debug, Clone)]
pub enum ProbeKind {
    Web(WebTarget),
    Shell(String),
}

/// A fully validated web request.
#[derive(Debug, Clone)]
pub struct WebTarget {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub expected_status: u16,
}

/// A validated probe, ready to be scheduled.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    pub kind: ProbeKind,
    pub pattern: Option<Regex>,
    pub tries: u32,
    pub retry_delay: Duration,
    pub interval: Duration,
    pub notify: Option<Recipient>,
    pub alert: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

impl ProbeSpec {
    pub fn web(url: impl Into<String>) -> Self {
        Self { web: Some(url.into()), ..Self::default() }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self { shell: Some(command.into()), ..Self::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn with_sleep(mut self, seconds: u64) -> Self {
        self.sleep = seconds;
        self
    }

    pub fn with_repeat(mut self, seconds: u64) -> Self {
        self.repeat = seconds;
        self
    }

    pub fn with_notify(mut self, recipient: Recipient) -> Self {
        self.notify = Some(recipient);
        self
    }

    pub fn with_alert(mut self, command: impl Into<String>) -> Self {
        self.alert = Some(command.into());
        self
    }

    /// Name shown in logs, notifications and the status document.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.web))
            .or_else(|| non_empty(&self.shell))
            .unwrap_or_default()
    }

    pub fn expected_status(&self) -> u16 {
        if self.expected_status == 0 { DEFAULT_STATUS_CODE } else { self.expected_status }
    }

    pub fn tries(&self) -> u32 {
        if self.tries == 0 { DEFAULT_TRIES } else { self.tries }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.sleep)
    }

    pub fn poll_interval(&self) -> Duration {
        let repeat = if self.repeat == 0 { DEFAULT_REPEAT_SECONDS } else { self.repeat };
        Duration::from_secs(repeat)
    }

    /// Resolve which strategy this entry uses.
    pub fn kind(&self) -> Result<ProbeKind, ConfigError> {
        match (non_empty(&self.web), non_empty(&self.shell)) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTargets),
            (None, None) => Err(ConfigError::MissingTarget),
            (Some(web), None) => self.web_target(web).map(ProbeKind::Web),
            (None, Some(shell)) => Ok(ProbeKind::Shell(shell.to_string())),
        }
    }

    fn web_target(&self, web: &str) -> Result<WebTarget, ConfigError> {
        let url = Url::parse(web.trim())
            .map_err(|source| ConfigError::InvalidUrl { url: web.to_string(), source })?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        let method = non_empty(&self.method).map(str::trim).unwrap_or("GET");
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(method.to_string()))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(key.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(key.clone()))?;
            headers.insert(name, value);
        }

        Ok(WebTarget {
            url,
            method,
            headers,
            body: self.body.clone(),
            expected_status: self.expected_status(),
        })
    }

    /// Validate the entry and compile its pattern.
    ///
    /// The pattern is compiled here and only here, so a malformed expression
    /// is reported once per probe instead of once per poll.
    pub fn compile(&self) -> Result<Probe, ConfigError> {
        let kind = self.kind()?;
        let pattern = non_empty(&self.pattern)
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Probe {
            name: self.display_name().to_string(),
            kind,
            pattern,
            tries: self.tries(),
            retry_delay: self.retry_delay(),
            interval: self.poll_interval(),
            notify: self.notify.clone().filter(|recipient| !recipient.is_empty()),
            alert: non_empty(&self.alert).map(str::to_string),
        })
    }
}

impl Probe {
    /// URL or command line, for log context.
    pub fn target(&self) -> &str {
        match &self.kind {
            ProbeKind::Web(web) => web.url.as_str(),
            ProbeKind::Shell(command) => command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
- name: Example
  web: https://example.com/
  match: Example Domain
  tries: 3
  sleep: 2
  notify: admin@example.com
- shell: echo ok
  notify:
    - ops@example.com
    - dev@example.com
  alert: /usr/local/bin/page
  repeat: 60
- web: http://localhost:8080/api
  method: post
  return: 201
  headers:
    Content-Type: application/json
  body: '{"ping": true}'
"#;

    fn load() -> Vec<ProbeSpec> {
        serde_yaml::from_str(CONFIG).unwrap()
    }

    #[test]
    fn test_parse_config_entries() {
        let specs = load();
        assert_eq!(specs.len(), 3);

        assert_eq!(specs[0].name.as_deref(), Some("Example"));
        assert_eq!(specs[0].pattern.as_deref(), Some("Example Domain"));
        assert_eq!(specs[0].tries(), 3);
        assert_eq!(specs[0].retry_delay(), Duration::from_secs(2));
        assert_eq!(specs[0].notify, Some(Recipient::Single("admin@example.com".into())));

        assert_eq!(specs[1].display_name(), "echo ok");
        assert_eq!(specs[1].poll_interval(), Duration::from_secs(60));
        assert_eq!(
            specs[1].notify.as_ref().map(Recipient::to_header).as_deref(),
            Some("ops@example.com, dev@example.com")
        );
    }

    #[test]
    fn test_defaults() {
        let spec = ProbeSpec::web("https://example.com/");
        assert_eq!(spec.expected_status(), 200);
        assert_eq!(spec.tries(), 1);
        assert_eq!(spec.retry_delay(), Duration::ZERO);
        assert_eq!(spec.poll_interval(), Duration::from_secs(30));
        assert_eq!(spec.display_name(), "https://example.com/");
    }

    #[test]
    fn test_empty_name_falls_back_to_target() {
        let spec = ProbeSpec::shell("uptime").with_name("  ");
        assert_eq!(spec.display_name(), "uptime");
    }

    #[test]
    fn test_web_request_shaping() {
        let specs = load();
        let probe = specs[2].compile().unwrap();
        let ProbeKind::Web(target) = probe.kind else {
            panic!("expected a web probe");
        };
        assert_eq!(target.method, Method::POST);
        assert_eq!(target.expected_status, 201);
        assert_eq!(target.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(target.body.as_deref(), Some(r#"{"ping": true}"#));
    }

    #[test]
    fn test_target_validation() {
        assert!(matches!(ProbeSpec::default().kind(), Err(ConfigError::MissingTarget)));

        let both = ProbeSpec { shell: Some("true".into()), ..ProbeSpec::web("http://a/") };
        assert!(matches!(both.kind(), Err(ConfigError::ConflictingTargets)));

        let blank = ProbeSpec { web: Some(String::new()), shell: Some("true".into()), ..Default::default() };
        assert!(matches!(blank.kind(), Ok(ProbeKind::Shell(_))));

        assert!(matches!(
            ProbeSpec::web("ftp://example.com/").kind(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(ProbeSpec::web("not a url").kind(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let spec = ProbeSpec::shell("echo ok").with_pattern("(unclosed");
        assert!(matches!(spec.compile(), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_invalid_method_and_header() {
        let mut spec = ProbeSpec::web("http://example.com/");
        spec.method = Some("GE T".into());
        assert!(matches!(spec.compile(), Err(ConfigError::InvalidMethod(_))));

        let mut spec = ProbeSpec::web("http://example.com/");
        spec.headers.insert("bad header".into(), "x".into());
        assert!(matches!(spec.compile(), Err(ConfigError::InvalidHeader(_))));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Vec<ProbeSpec>, _> = serde_yaml::from_str("- web: http://a/\n  retries: 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_drops_empty_notification_targets() {
        let probe = ProbeSpec::shell("true")
            .with_notify(Recipient::Multiple(vec![" ".into()]))
            .with_alert("")
            .compile()
            .unwrap();
        assert!(probe.notify.is_none());
        assert!(probe.alert.is_none());
    }
}
