use std::str::FromStr;
use std::{env, fmt, fs, path};

use sentinel::ProbeSpec;
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;

/// Probe list as loaded from the YAML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub probes: Vec<ProbeSpec>,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configured probes:")?;
        for probe in &self.probes {
            let target = probe.web.as_deref().or(probe.shell.as_deref()).unwrap_or_default();
            writeln!(f, "  {}: {} (every {:?})", probe.display_name(), target, probe.poll_interval())?;
        }
        Ok(())
    }
}

impl Config {
    /// Read and parse the probe list at `path`.
    ///
    /// An empty document is an empty probe list.
    pub fn from_file(path: impl AsRef<path::Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|source| AppError::ConfigRead { path: path.to_path_buf(), source })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw)
            .map_err(|source| AppError::ConfigParse { path: path.to_path_buf(), source })
    }
}

fn get_env_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Listen address of the status server, from `HOST` and `PORT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self { host: get_env_var("HOST", DEFAULT_HOST.to_string()), port: get_env_var("PORT", DEFAULT_PORT) }
    }

    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_from_file() {
        let file = write(
            "- name: Example\n  web: https://example.com/\n  match: Example Domain\n\
             - shell: echo ok\n  repeat: 60\n",
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.probes.len(), 2);
        assert_eq!(config.probes[0].display_name(), "Example");
        assert_eq!(config.probes[1].display_name(), "echo ok");

        let summary = config.to_string();
        assert!(summary.contains("Example: https://example.com/"));
        assert!(summary.contains("echo ok: echo ok (every 60s)"));
    }

    #[test]
    fn test_empty_file_has_no_probes() {
        let file = write("\n");
        assert!(Config::from_file(file.path()).unwrap().probes.is_empty());
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = Config::from_file(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(error, AppError::ConfigRead { .. }));
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        for contents in ["- web: [unclosed\n", "- shell: true\n  retries: 3\n", "web: https://a/\n"] {
            let file = write(contents);
            let error = Config::from_file(file.path()).unwrap_err();
            assert!(matches!(error, AppError::ConfigParse { .. }), "{contents}: {error}");
            assert_eq!(error.exit_code(), 5);
        }
    }

    #[test]
    fn test_server_config_display() {
        let server = ServerConfig { host: DEFAULT_HOST.into(), port: DEFAULT_PORT };
        assert_eq!(server.to_string(), "localhost:3000");
        assert_eq!(server.address(), ("localhost", 3000));
    }
}
