use thiserror::Error;

/// A probe definition that can never be executed.
///
/// These are permanent: the probe is reported once, marked failed and never
/// polled. They never take the process down.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("entry has neither a web nor a shell check")]
    MissingTarget,
    #[error("web and shell checks in one entry are not allowed")]
    ConflictingTargets,
    #[error("invalid match pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),
    #[error("invalid HTTP header `{0}`")]
    InvalidHeader(String),
}
